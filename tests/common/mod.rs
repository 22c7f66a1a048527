#![allow(dead_code)]

use boxplot_web::error::AppError;
use boxplot_web::graph::{BoxPlot, PlotRenderer};
use boxplot_web::storage::{Storage, UploadHandle};
use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Renderer that writes the plot title as the "image" and remembers every call
#[derive(Default)]
pub struct RecordingRenderer {
    plots: Mutex<Vec<(String, BoxPlot)>>,
}

impl RecordingRenderer {
    pub fn plots(&self) -> Vec<(String, BoxPlot)> {
        self.plots.lock().unwrap().clone()
    }

    pub fn plot(&self, image: &str) -> BoxPlot {
        self.plots()
            .into_iter()
            .find(|(name, _)| name == image)
            .map(|(_, plot)| plot)
            .unwrap_or_else(|| panic!("no plot rendered as {}", image))
    }
}

impl PlotRenderer for RecordingRenderer {
    fn render(&self, plot: &BoxPlot, path: &Path) -> Result<(), AppError> {
        std::fs::write(path, plot.title.as_bytes())?;
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.plots.lock().unwrap().push((name, plot.clone()));
        Ok(())
    }
}

pub fn storage() -> (TempDir, Storage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().join("uploads"), dir.path().join("outputs")).unwrap();
    (dir, storage)
}

/// Rows of `g`, `s`, `v` written as a workbook; `None` leaves the cell blank
pub fn workbook(rows: &[(&str, &str, Option<f64>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "g").unwrap();
    sheet.write_string(0, 1, "s").unwrap();
    sheet.write_string(0, 2, "v").unwrap();

    for (i, (g, s, v)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *g).unwrap();
        sheet.write_string(row, 1, *s).unwrap();
        if let Some(v) = v {
            sheet.write_number(row, 2, *v).unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}

pub fn upload_workbook(storage: &Storage, rows: &[(&str, &str, Option<f64>)]) -> UploadHandle {
    storage.save_upload("data.xlsx", &workbook(rows)).unwrap()
}

pub fn upload_csv(storage: &Storage, contents: &str) -> UploadHandle {
    storage.save_upload("data.csv", contents.as_bytes()).unwrap()
}

pub fn zip_entries(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

pub fn dir_entries(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
