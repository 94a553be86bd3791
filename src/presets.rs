//! Canned edit instructions offered next to the free-text prompt.

use clap::ValueEnum;

/// A ready-made instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Cut the product out onto a clean background.
    RemoveBackground,
    /// Remove harsh shadows and reflections.
    CleanShadows,
    /// Vintage film look.
    Retro,
    /// Punchier, saturated colors.
    Vivid,
}

impl Preset {
    /// The instruction text sent for this preset.
    #[must_use]
    pub fn instruction(self) -> &'static str {
        match self {
            Self::RemoveBackground => "Remove background",
            Self::CleanShadows => "Clean up shadows",
            Self::Retro => "Retro style",
            Self::Vivid => "Vivid colors",
        }
    }

    /// Parse a preset by its CLI name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error listing the valid names.
    pub fn parse(name: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(name.trim(), true).map_err(|_| {
            format!("Unknown preset '{}'. Valid: {}", name.trim(), Self::names().join(", "))
        })
    }

    /// All CLI names, in declaration order.
    #[must_use]
    pub fn names() -> Vec<String> {
        Self::value_variants()
            .iter()
            .filter_map(|p| p.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_match_labels() {
        assert_eq!(Preset::RemoveBackground.instruction(), "Remove background");
        assert_eq!(Preset::CleanShadows.instruction(), "Clean up shadows");
        assert_eq!(Preset::Retro.instruction(), "Retro style");
        assert_eq!(Preset::Vivid.instruction(), "Vivid colors");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Preset::parse("Remove-Background").unwrap(), Preset::RemoveBackground);
        assert_eq!(Preset::parse(" vivid ").unwrap(), Preset::Vivid);
    }

    #[test]
    fn parse_unknown_lists_names() {
        let err = Preset::parse("sepia").unwrap_err();
        assert!(err.contains("remove-background, clean-shadows, retro, vivid"));
    }
}
