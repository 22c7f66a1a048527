use crate::archive::build_archive;
use crate::dataset::Dataset;
use crate::error::AppError;
use crate::graph::{BoxPlot, BoxSummary, PlotRenderer};
use crate::loader::load_dataset;
use crate::partition::{Partition, partition, sub_partition};
use crate::storage::Storage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Body of a generate-plot request as sent by the client
///
/// Every field is optional at this stage so that a missing or mistyped
/// field is reported by [`PlotRequest::try_from`] rather than by the JSON
/// extractor. The snake_case names of the first web client are accepted
/// as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlotRequest {
    #[serde(alias = "file_id")]
    pub upload_id: Option<String>,
    pub filename: Option<String>,
    #[serde(alias = "group_col")]
    pub group_column: Option<String>,
    #[serde(alias = "value_col")]
    pub value_column: Option<String>,
    #[serde(alias = "l2_col")]
    pub secondary_column: Option<String>,
    #[serde(alias = "selected_groups")]
    pub selected_groups: Option<Vec<Value>>,
}

/// A generate-plot request that passed validation
#[derive(Clone, Debug, PartialEq)]
pub struct PlotRequest {
    pub upload_id: String,
    pub filename: String,
    pub group_column: Option<String>,
    pub value_column: String,
    pub secondary_column: Option<String>,
    pub selected_groups: Vec<String>,
}

impl TryFrom<GeneratePlotRequest> for PlotRequest {
    type Error = AppError;

    fn try_from(raw: GeneratePlotRequest) -> Result<Self, Self::Error> {
        let upload_id = required(raw.upload_id, "uploadId")?;
        if uuid::Uuid::parse_str(&upload_id).is_err() {
            return Err(AppError::InvalidRequest(format!(
                "uploadId is not a valid identifier: {}",
                upload_id
            )));
        }

        let selected_groups = raw
            .selected_groups
            .unwrap_or_default()
            .into_iter()
            .map(|group| match group {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(AppError::InvalidRequest(format!(
                    "selectedGroups entries must be strings or numbers, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlotRequest {
            upload_id,
            filename: required(raw.filename, "filename")?,
            group_column: optional(raw.group_column),
            value_column: required(raw.value_column, "valueColumn")?,
            secondary_column: optional(raw.secondary_column),
            selected_groups,
        })
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, AppError> {
    optional(field).ok_or_else(|| AppError::InvalidRequest(format!("{} is required", name)))
}

fn optional(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

/// Body returned by a successful generate-plot request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub images: Vec<String>,
    pub upload_id: String,
    pub archive_name: String,
}

/// File name of the image drawn for one group
///
/// Path separators and control characters in the key are replaced so the
/// image always lands inside its batch directory.
///
/// # Examples
/// ```
/// use boxplot_web::plot::image_name;
///
/// assert_eq!(image_name("A", 1700000000000), "A_boxplot_1700000000000.png");
/// assert_eq!(image_name("x/y", 1), "x_y_boxplot_1.png");
/// ```
pub fn image_name(group: &str, timestamp: i64) -> String {
    let safe: String = group
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let safe = if safe == "." || safe == ".." {
        safe.replace('.', "_")
    } else {
        safe
    };
    format!("{}_boxplot_{}.png", safe, timestamp)
}

/// Image name not yet taken in this batch
///
/// Distinct keys can sanitise to the same name (`a/b` and `a_b`); later
/// ones get a `_2`, `_3`, ... suffix after the group part.
fn unique_image_name(group: &str, timestamp: i64, taken: &mut HashSet<String>) -> String {
    let mut name = image_name(group, timestamp);
    let mut n = 2;
    while taken.contains(&name) {
        name = image_name(&format!("{}_{}", group, n), timestamp);
        n += 1;
    }
    taken.insert(name.clone());
    name
}

/// File name of the archive for one batch
pub fn archive_name(upload_id: &str, timestamp: i64) -> String {
    format!("{}_boxplots_{}.zip", upload_id, timestamp)
}

/// Produce the box-plot batch for one request
///
/// The uploaded file is read again, every requested column is checked, and
/// only then is the previous batch of this upload cleared. Groups whose
/// sample is empty (or, with a secondary column, whose categories are all
/// empty) are skipped without error.
///
/// # Arguments
/// * `storage` - Upload and output locations
/// * `renderer` - Draws each image
/// * `request` - Validated request
/// * `timestamp` - Milliseconds since the Unix epoch, shared by every file of the batch
///
/// # Returns
/// * `Result<GenerateResponse, AppError>` - Image names in group order plus the archive name
pub fn generate(
    storage: &Storage,
    renderer: &dyn PlotRenderer,
    request: &PlotRequest,
    timestamp: i64,
) -> Result<GenerateResponse, AppError> {
    let upload = storage.upload_path(&request.upload_id, &request.filename)?;
    if !upload.is_file() {
        return Err(AppError::UploadNotFound(format!(
            "{}/{}",
            request.upload_id, request.filename
        )));
    }

    let dataset = load_dataset(&upload)?;
    let value_index = require_column(&dataset, &request.value_column)?;
    if let Some(column) = &request.group_column {
        require_column(&dataset, column)?;
    }
    if let Some(column) = &request.secondary_column {
        require_column(&dataset, column)?;
    }

    let partitions = partition(
        &dataset,
        request.group_column.as_deref(),
        Some(request.selected_groups.as_slice()),
    )?;

    let batch_dir = storage.reset_batch(&request.upload_id)?;
    let mut images = Vec::with_capacity(partitions.len());
    let mut taken = HashSet::with_capacity(partitions.len());

    for part in &partitions {
        let group = part.key.to_string();
        let plot = match &request.secondary_column {
            None => single_box(&dataset, part, value_index, &group, &request.value_column),
            Some(secondary) => multi_box(
                &dataset,
                part,
                value_index,
                &group,
                &request.value_column,
                secondary,
            )?,
        };

        let Some(plot) = plot else {
            debug!("group {} has no numeric values, skipped", group);
            continue;
        };

        let image = unique_image_name(&group, timestamp, &mut taken);
        renderer.render(&plot, &batch_dir.join(&image))?;
        debug!("rendered {} ({} boxes)", image, plot.boxes.len());
        images.push(image);
    }

    let archive = archive_name(&request.upload_id, timestamp);
    build_archive(&batch_dir, &images, &storage.archive_path(&archive)?)?;

    info!(
        "upload {}: {} groups, {} images, archive {}",
        request.upload_id,
        partitions.len(),
        images.len(),
        archive
    );

    Ok(GenerateResponse {
        images,
        upload_id: request.upload_id.clone(),
        archive_name: archive,
    })
}

fn require_column(dataset: &Dataset, column: &str) -> Result<usize, AppError> {
    dataset
        .column_index(column)
        .ok_or_else(|| AppError::ColumnNotFound(column.to_string()))
}

fn single_box(
    dataset: &Dataset,
    part: &Partition,
    value_index: usize,
    group: &str,
    value_column: &str,
) -> Option<BoxPlot> {
    let sample = dataset.sample(&part.rows, value_index);
    let summary = BoxSummary::from_sample("", &sample)?;
    Some(BoxPlot::single(group, value_column, summary))
}

fn multi_box(
    dataset: &Dataset,
    part: &Partition,
    value_index: usize,
    group: &str,
    value_column: &str,
    secondary_column: &str,
) -> Result<Option<BoxPlot>, AppError> {
    let subs = sub_partition(dataset, part, secondary_column)?;
    let boxes = subs
        .iter()
        .filter_map(|sub| {
            BoxSummary::from_sample(sub.key.to_string(), &dataset.sample(&sub.rows, value_index))
        })
        .collect();
    Ok(BoxPlot::multi(
        group,
        value_column,
        secondary_column,
        subs.len(),
        boxes,
    ))
}
