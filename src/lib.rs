/*!
# Box-Plot Web Service

A small web service that turns an uploaded spreadsheet into box-plot images,
one per group, and bundles them into a downloadable zip archive.

## Overview

A user uploads a workbook or CSV file, picks a value column, optionally a
grouping column and a secondary category column, and optionally restricts the
groups to plot. The service computes quartiles and IQR fences per group,
chooses a value-axis range, renders one PNG per group and zips the batch.

## Architecture

### HTTP Layer
- **Technologies**: Rust, axum, tokio
- `app` - Routing, handlers, download responses
- `config` - Command line / environment settings

### Processing Layer
- `loader` - Workbook (calamine) and CSV reading into a `Dataset`
- `partition` - Grouping of rows by one or two categorical columns
- `stats` - Quartiles and outlier fences
- `axis` - Value-axis range for single- and multi-box images
- `graph` - Box-plot description and the plotters renderer
- `plot` - The generate-plot pipeline and its request/response bodies

### Data Persistence Layer
- `storage` - Upload and output directories, keyed by upload id
- `archive` - Zip bundling of a batch

## REST API Endpoints

- `POST /upload_file` - Stores a spreadsheet, returns its columns
- `POST /generate_plot` - Renders the box plots of an upload
- `GET /outputs/{upload_id}/{filename}` - Downloads one image
- `GET /download_zip/{zip_name}` - Downloads a batch archive
*/

pub mod archive;
pub mod axis;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod loader;
pub mod partition;
pub mod plot;
pub mod stats;
pub mod storage;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;

pub use error::AppError;
