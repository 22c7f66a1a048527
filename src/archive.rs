use crate::error::AppError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bundle the images of one batch into a zip file
///
/// Each image is read from `batch_dir` and stored under its bare file name,
/// so the archive has no directory entries. An empty image list produces a
/// valid archive with zero entries.
///
/// # Arguments
/// * `batch_dir` - Directory holding the rendered images
/// * `images` - File names of the images, in archive order
/// * `archive_path` - Destination of the zip file, replaced if it exists
///
/// # Errors
/// * Returns an error if a listed image cannot be read or the archive
///   cannot be written
pub fn build_archive(batch_dir: &Path, images: &[String], archive_path: &Path) -> Result<(), AppError> {
    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for image in images {
        let bytes = std::fs::read(batch_dir.join(image))?;
        writer.start_file(image.as_str(), options)?;
        writer.write_all(&bytes)?;
    }

    let mut out = writer.finish()?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).unwrap();
                (entry.name().to_string(), buf)
            })
            .collect()
    }

    #[test]
    fn stores_images_flat() {
        let dir = tempfile::tempdir().unwrap();
        let batch = dir.path().join("batch");
        std::fs::create_dir(&batch).unwrap();
        std::fs::write(batch.join("A_boxplot_1.png"), b"a").unwrap();
        std::fs::write(batch.join("B_boxplot_1.png"), b"b").unwrap();
        std::fs::write(batch.join("stale.png"), b"old").unwrap();

        let zip_path = dir.path().join("out.zip");
        let images = vec!["A_boxplot_1.png".to_string(), "B_boxplot_1.png".to_string()];
        build_archive(&batch, &images, &zip_path).unwrap();

        assert_eq!(
            entries(&zip_path),
            vec![
                ("A_boxplot_1.png".to_string(), b"a".to_vec()),
                ("B_boxplot_1.png".to_string(), b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn empty_batch_gives_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        build_archive(dir.path(), &[], &zip_path).unwrap();
        assert!(entries(&zip_path).is_empty());
    }

    #[test]
    fn missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bad.zip");
        let images = vec!["nope.png".to_string()];
        assert!(matches!(
            build_archive(dir.path(), &images, &zip_path),
            Err(AppError::Io(_))
        ));
    }
}
