//! Pure construction of transformation parameters from the user's choices.
//!
//! Nothing here touches pixels or the network: an [`EditState`] plus the
//! source dimensions deterministically map to a [`Transformation`], which
//! the URL layer renders for the CDN to execute.

/// At most one enhancement applies at a time; picking a new one replaces
/// the previous choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enhancement {
    #[default]
    None,
    Improve,
    Restore,
    RemoveBackground,
}

impl Enhancement {
    pub const ALL: [Enhancement; 4] = [
        Enhancement::None,
        Enhancement::Improve,
        Enhancement::Restore,
        Enhancement::RemoveBackground,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Enhancement::None => "None",
            Enhancement::Improve => "Improve",
            Enhancement::Restore => "Restore",
            Enhancement::RemoveBackground => "Remove background",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    None,
    Square,
    Landscape,
    Portrait,
}

impl CropPreset {
    pub const ALL: [CropPreset; 4] = [
        CropPreset::None,
        CropPreset::Square,
        CropPreset::Landscape,
        CropPreset::Portrait,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CropPreset::None => "Original",
            CropPreset::Square => "Square",
            CropPreset::Landscape => "Landscape",
            CropPreset::Portrait => "Portrait",
        }
    }
}

/// Filters are mutually exclusive; `None` clears them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Sizzle,
}

impl Filter {
    pub const ALL: [Filter; 4] = [Filter::None, Filter::Grayscale, Filter::Sepia, Filter::Sizzle];

    pub fn label(self) -> &'static str {
        match self {
            Filter::None => "No filter",
            Filter::Grayscale => "Grayscale",
            Filter::Sepia => "Sepia",
            Filter::Sizzle => "Sizzle",
        }
    }
}

/// Transient per-resource edit choices. Resets whenever a save, discard, or
/// resource change occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditState {
    pub enhancement: Enhancement,
    pub crop: CropPreset,
    pub filter: Filter,
}

impl EditState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parameter object for one edit of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    pub enhancement: Enhancement,
    pub crop: CropPreset,
    pub filter: Filter,
    source_width: u32,
    source_height: u32,
}

impl Transformation {
    /// Map the edit choices onto transformation parameters for a source of
    /// the given dimensions. Pure: identical inputs yield identical output.
    pub fn build(source_width: u32, source_height: u32, edit: EditState) -> Self {
        Self {
            enhancement: edit.enhancement,
            crop: edit.crop,
            filter: edit.filter,
            source_width,
            source_height,
        }
    }

    /// True iff any parameter deviates from the defaults. Gates the save
    /// actions: an unchanged image has nothing to persist.
    pub fn has_changes(&self) -> bool {
        self.enhancement != Enhancement::None
            || self.crop != CropPreset::None
            || self.filter != Filter::None
    }

    /// Output dimensions after the crop preset.
    ///
    /// Square uses the shorter source edge; landscape and portrait force a
    /// 16:9 ratio against the preserved edge, flooring the derived one.
    pub fn effective_size(&self) -> (u32, u32) {
        let (w, h) = (self.source_width, self.source_height);
        match self.crop {
            CropPreset::None => (w, h),
            CropPreset::Square => {
                let side = w.min(h);
                (side, side)
            }
            CropPreset::Landscape => (w, w * 9 / 16),
            CropPreset::Portrait => (h * 9 / 16, h),
        }
    }
}

/// How the displayed image should fill its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasFit {
    /// Wider than tall: scale to the container width, preserve aspect.
    FitWidth,
    /// Portrait or square: scale to the container height.
    FitHeight,
}

/// Display layout as a pure function of the effective output dimensions.
pub fn canvas_fit(width: u32, height: u32) -> CanvasFit {
    if width > height {
        CanvasFit::FitWidth
    } else {
        CanvasFit::FitHeight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_edit_has_no_changes() {
        let t = Transformation::build(800, 600, EditState::default());
        assert!(!t.has_changes());
        assert_eq!(t.effective_size(), (800, 600));
    }

    #[test]
    fn any_single_choice_counts_as_a_change() {
        let base = EditState::default();
        for edit in [
            EditState {
                enhancement: Enhancement::Improve,
                ..base
            },
            EditState {
                crop: CropPreset::Square,
                ..base
            },
            EditState {
                filter: Filter::Grayscale,
                ..base
            },
        ] {
            assert!(Transformation::build(800, 600, edit).has_changes());
        }
    }

    #[test]
    fn landscape_crop_forces_sixteen_nine_from_width() {
        let edit = EditState {
            crop: CropPreset::Landscape,
            ..EditState::default()
        };
        let t = Transformation::build(1600, 1600, edit);
        assert_eq!(t.effective_size(), (1600, 900));
    }

    #[test]
    fn portrait_crop_forces_sixteen_nine_from_height() {
        let edit = EditState {
            crop: CropPreset::Portrait,
            ..EditState::default()
        };
        let t = Transformation::build(1600, 1600, edit);
        assert_eq!(t.effective_size(), (900, 1600));
    }

    #[test]
    fn landscape_derived_height_is_floored() {
        let edit = EditState {
            crop: CropPreset::Landscape,
            ..EditState::default()
        };
        // 1000 * 9 / 16 = 562.5, floored to 562.
        let t = Transformation::build(1000, 800, edit);
        assert_eq!(t.effective_size(), (1000, 562));
    }

    #[test]
    fn square_crop_uses_the_shorter_edge() {
        let edit = EditState {
            crop: CropPreset::Square,
            ..EditState::default()
        };
        let t = Transformation::build(2000, 1000, edit);
        assert_eq!(t.effective_size(), (1000, 1000));
    }

    #[test]
    fn build_is_idempotent() {
        let edit = EditState {
            enhancement: Enhancement::Restore,
            crop: CropPreset::Landscape,
            filter: Filter::Sepia,
        };
        assert_eq!(
            Transformation::build(1600, 900, edit),
            Transformation::build(1600, 900, edit)
        );
    }

    #[test]
    fn canvas_fit_matches_orientation() {
        assert_eq!(canvas_fit(1600, 900), CanvasFit::FitWidth);
        assert_eq!(canvas_fit(900, 1600), CanvasFit::FitHeight);
        // Square images share the portrait layout.
        assert_eq!(canvas_fit(1000, 1000), CanvasFit::FitHeight);
    }

    #[test]
    fn edit_state_reset_restores_defaults() {
        let mut edit = EditState {
            enhancement: Enhancement::RemoveBackground,
            crop: CropPreset::Portrait,
            filter: Filter::Sizzle,
        };
        edit.reset();
        assert_eq!(edit, EditState::default());
    }
}
