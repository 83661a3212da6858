//! Image reading and writing for rffd.
//!
//! A thin I/O boundary around the transform core: images are scalar volumes
//! paired with the grid geometry that places them in physical space. File
//! formats are dispatched by extension; the core crate never depends on any
//! of this.

pub mod nifti_io;
pub mod volume;

pub use nifti_io::{read_nifti, write_nifti};
pub use volume::ImageVolume;

use std::path::Path;

use anyhow::Result;

fn is_nifti(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".nii") || name.ends_with(".nii.gz")
}

/// Read an image volume and its grid geometry, dispatching on extension.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<ImageVolume> {
    let path = path.as_ref();
    if is_nifti(path) {
        read_nifti(path)
    } else {
        anyhow::bail!("Unsupported image format: {}", path.display())
    }
}

/// Write an image volume and its grid geometry, dispatching on extension.
pub fn write_image<P: AsRef<Path>>(path: P, image: &ImageVolume) -> Result<()> {
    let path = path.as_ref();
    if is_nifti(path) {
        write_nifti(path, image)
    } else {
        anyhow::bail!("Unsupported image format: {}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = read_image("image.tiff").unwrap_err();
        assert!(err.to_string().contains("Unsupported image format"));
    }

    #[test]
    fn test_nifti_extensions_recognized() {
        assert!(is_nifti(Path::new("a/b/scan.nii")));
        assert!(is_nifti(Path::new("scan.nii.gz")));
        assert!(!is_nifti(Path::new("scan.mha")));
    }
}
