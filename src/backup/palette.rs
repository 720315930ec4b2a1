//! Legacy colour palette.
//!
//! Old versions stored colours as an index into a fixed 21-entry palette.
//! Newer versions store the ARGB value itself. [`ColorPalette`] resolves an
//! index to ARGB so a caller with its own theme resources can substitute them.

/// Resolves legacy palette indexes to opaque ARGB colours.
pub trait ColorPalette {
    /// ARGB for `index`, or 0 (no colour) for an unknown index.
    fn android_color(&self, index: i32) -> i32;
}

/// Material Design 500-weight colours, in legacy palette order.
const MATERIAL_COLORS: [u32; 21] = [
    0xFF60_7D8B, // blue grey
    0xFF21_2121, // grey 900
    0xFFF4_4336, // red
    0xFFE9_1E63, // pink
    0xFF9C_27B0, // purple
    0xFF67_3AB7, // deep purple
    0xFF3F_51B5, // indigo
    0xFF21_96F3, // blue
    0xFF03_A9F4, // light blue
    0xFF00_BCD4, // cyan
    0xFF00_9688, // teal
    0xFF4C_AF50, // green
    0xFF8B_C34A, // light green
    0xFFCD_DC39, // lime
    0xFFFF_EB3B, // yellow
    0xFFFF_C107, // amber
    0xFFFF_9800, // orange
    0xFFFF_5722, // deep orange
    0xFF79_5548, // brown
    0xFF9E_9E9E, // grey
    0xFFFF_FFFF, // white
];

/// The stock palette.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialPalette;

impl ColorPalette for MaterialPalette {
    fn android_color(&self, index: i32) -> i32 {
        usize::try_from(index)
            .ok()
            .and_then(|i| MATERIAL_COLORS.get(i))
            .map(|&argb| argb as i32)
            .unwrap_or(0)
    }
}
