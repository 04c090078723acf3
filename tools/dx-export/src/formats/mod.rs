//! Text grammar of DirectX .x files (`xof 0303txt 0032`)
//!
//! Small building blocks shared by every encoder: number formatting, list
//! separators, identifier sanitising and the `FrameTransformMatrix` template.

use glam::Mat4;

/// Magic header of a plain-text .x file
pub const HEADER: &str = "xof 0303txt 0032\n\n";

/// Inverse bind matrix written for bones without skinning data
pub const IDENTITY_WEIGHTS_MATRIX: &str =
    "1.0,0.0,0.0,0.0, 0.0,1.0,0.0,0.0, 0.0,0.0,1.0,0.0, 0.0,0.0,0.0,1.0";

/// Format a number with six decimals, like C's `%f`.
///
/// Negative zero is written as `0.000000`.
pub fn float(v: f32) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{:.6}", v)
}

/// Separator after list item `index` of `len` items.
///
/// Every list in the format separates items with `more` and ends the last one
/// with `last`.
pub fn separator(index: usize, len: usize, more: &'static str, last: &'static str) -> &'static str {
    if index + 1 == len {
        last
    } else {
        more
    }
}

/// Make `name` usable as a .x identifier.
pub fn validate_name(name: &str) -> String {
    name.replace('.', "_")
}

/// The 16 matrix values in DirectX order (row-major, row vectors).
///
/// glam stores column vectors column by column, which is the same sequence.
pub fn matrix_values(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}

/// Matrix values separated by `,` and terminated by `;;`, on one line.
pub fn flat_matrix(m: &Mat4) -> String {
    let values = matrix_values(m);
    let mut out = String::with_capacity(16 * 10);
    for (i, v) in values.iter().enumerate() {
        out.push_str(&float(*v));
        out.push_str(separator(i, values.len(), ",", ";;"));
    }
    out
}

/// `FrameTransformMatrix` block, four values per row.
pub fn frame_transform_matrix(m: &Mat4) -> String {
    let v = matrix_values(m);
    let mut out = String::from("FrameTransformMatrix {\n");
    for row in 0..4 {
        let r = &v[row * 4..row * 4 + 4];
        out.push_str(&format!(
            "    {}, {}, {}, {}{}\n",
            float(r[0]),
            float(r[1]),
            float(r[2]),
            float(r[3]),
            if row == 3 { ";;" } else { "," }
        ));
    }
    out.push_str("}\n");
    out
}

/// Basename of a texture path as written into a `TextureFilename` block.
pub fn texture_basename(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    base.trim().replace("//", "")
}
