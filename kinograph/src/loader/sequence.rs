use std::path::{Path, PathBuf};

/// Build the path of one frame of a numbered image sequence.
///
/// The frame number is zero padded to `zero_padding` digits and wrapped in
/// the prefix and suffix, e.g. `shot01.` / 4 / `.png` gives
/// `shot01.0042.png`.
pub fn frame_path(
    base: &Path,
    name_prefix: &str,
    frame: i64,
    zero_padding: usize,
    name_suffix: &str,
) -> PathBuf {
    base.join(format!(
        "{}{:0width$}{}",
        name_prefix,
        frame,
        name_suffix,
        width = zero_padding
    ))
}
