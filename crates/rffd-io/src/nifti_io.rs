//! NIfTI reading and writing.
//!
//! Geometry is decomposed from the NIfTI affine: the origin is the affine
//! translation, spacing the column norms, and direction the normalized
//! columns. Writing recomposes the affine into an sform header.

use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::SMatrix;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use rffd_core::spatial::{Direction, Point, Spacing};

use crate::volume::ImageVolume;

/// Read a NIfTI file into a volume with its grid geometry.
pub fn read_nifti<P: AsRef<Path>>(path: P) -> Result<ImageVolume> {
    let path = path.as_ref();
    let obj = ReaderOptions::new().read_file(path).context("Failed to read NIfTI file")?;
    let header = obj.header();

    let affine = if header.sform_code > 0 {
        [header.srow_x, header.srow_y, header.srow_z, [0.0, 0.0, 0.0, 1.0]]
    } else if header.qform_code > 0 {
        qform_affine(header)
    } else {
        // Fallback: pixdim scaling only
        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3];
        [
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    };

    let origin = Point::new([affine[0][3] as f64, affine[1][3] as f64, affine[2][3] as f64]);

    // Columns of the rotation matrix, scaled by spacing
    let cols: [nalgebra::Vector3<f64>; 3] = std::array::from_fn(|c| {
        nalgebra::Vector3::new(affine[0][c] as f64, affine[1][c] as f64, affine[2][c] as f64)
    });
    let norms = cols.map(|c| c.norm());
    let spacing = Spacing::new(norms);

    // Normalize to get direction cosines; degenerate columns fall back to
    // the matching cardinal axis.
    let axes = [
        nalgebra::Vector3::x(),
        nalgebra::Vector3::y(),
        nalgebra::Vector3::z(),
    ];
    let unit_cols: Vec<nalgebra::Vector3<f64>> = (0..3)
        .map(|c| if norms[c] > 1e-9 { cols[c] / norms[c] } else { axes[c] })
        .collect();
    let direction = Direction(SMatrix::<f64, 3, 3>::from_columns(&unit_cols));

    let data = obj
        .into_volume()
        .into_ndarray::<f64>()
        .context("Failed to convert volume to ndarray")?;
    if data.ndim() != 3 {
        anyhow::bail!("Expected 3D NIfTI file, found {} dimensions", data.ndim());
    }

    tracing::debug!(path = %path.display(), shape = ?data.shape(), "read NIfTI volume");
    ImageVolume::new(data, origin, spacing, direction)
}

/// Write a volume and its grid geometry to a NIfTI file.
pub fn write_nifti<P: AsRef<Path>>(path: P, image: &ImageVolume) -> Result<()> {
    use nifti::writer::WriterOptions;

    let path = path.as_ref();
    let geometry = image.geometry();
    let origin = geometry.origin();
    let spacing = geometry.spacing();
    let direction = geometry.direction();

    // Recompose the sform affine: direction columns scaled by spacing, with
    // the origin as translation.
    let row = |r: usize| -> [f32; 4] {
        [
            (direction[(r, 0)] * spacing[0]) as f32,
            (direction[(r, 1)] * spacing[1]) as f32,
            (direction[(r, 2)] * spacing[2]) as f32,
            origin[r] as f32,
        ]
    };

    let mut pixdim = [1.0f32; 8];
    for j in 0..3 {
        pixdim[j + 1] = spacing[j] as f32;
    }

    let header = NiftiHeader {
        sform_code: 1,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        pixdim,
        ..Default::default()
    };

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(image.data())
        .context("Failed to write NIfTI file")?;

    tracing::debug!(path = %path.display(), "wrote NIfTI volume");
    Ok(())
}

fn qform_affine(header: &NiftiHeader) -> [[f32; 4]; 4] {
    // Quaternion form, per the NIfTI standard
    let b = header.quatern_b;
    let c = header.quatern_c;
    let d = header.quatern_d;
    let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

    let qfac = if header.pixdim[0] == 0.0 { 1.0 } else { header.pixdim[0] };

    let r11 = a * a + b * b - c * c - d * d;
    let r12 = 2.0 * b * c - 2.0 * a * d;
    let r13 = 2.0 * b * d + 2.0 * a * c;

    let r21 = 2.0 * b * c + 2.0 * a * d;
    let r22 = a * a + c * c - b * b - d * d;
    let r23 = 2.0 * c * d - 2.0 * a * b;

    let r31 = 2.0 * b * d - 2.0 * a * c;
    let r32 = 2.0 * c * d + 2.0 * a * b;
    let r33 = a * a + d * d - c * c - b * b;

    let dx = header.pixdim[1];
    let dy = header.pixdim[2];
    let dz = header.pixdim[3] * qfac;

    [
        [r11 * dx, r12 * dy, r13 * dz, header.quatern_x],
        [r21 * dx, r22 * dy, r23 * dz, header.quatern_y],
        [r31 * dx, r32 * dy, r33 * dz, header.quatern_z],
        [0.0, 0.0, 0.0, 1.0],
    ]
}
