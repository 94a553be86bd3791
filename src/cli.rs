//! CLI argument parsing with clap.

use clap::Parser;

use crate::presets::Preset;

/// AI product-photo editor: upload a photo, describe the edit, get the result.
#[derive(Parser, Debug)]
#[command(name = "snapedit", version, about)]
pub struct Cli {
    /// Product photo to edit (PNG, JPEG, WebP, ...).
    pub image: Option<String>,

    /// Edit instruction, e.g. "remove the background and add a soft shadow".
    #[arg(conflicts_with_all = ["prompt_file", "preset"])]
    pub instruction: Option<String>,

    /// Path to a file containing the instruction text.
    #[arg(short = 'p', long, conflicts_with = "preset")]
    pub prompt_file: Option<String>,

    /// Use a canned instruction instead of writing one.
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Model name or short alias (default from config, then nano-banana).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Where to save the edited image (default: snapedit-ai-result.png).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Start an interactive editing session.
    #[arg(short, long)]
    pub interactive: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the instruction from the positional argument, the file flag,
    /// or the preset. Yields an empty string when none was given; the session
    /// rejects that at submit time.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn resolve_instruction(&self) -> Result<String, std::io::Error> {
        if let Some(ref text) = self.instruction {
            Ok(text.clone())
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path)
        } else {
            Ok(self.preset.map(Preset::instruction).unwrap_or_default().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_image_and_instruction() {
        let cli = Cli::parse_from(["snapedit", "shoe.jpg", "remove background"]);
        assert_eq!(cli.image.as_deref(), Some("shoe.jpg"));
        assert_eq!(cli.resolve_instruction().unwrap(), "remove background");
    }

    #[test]
    fn prompt_file_flag() {
        let dir = std::env::temp_dir().join("snapedit_cli_pf_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prompt.txt");
        std::fs::write(&path, "instruction from file").unwrap();

        let cli = Cli::parse_from(["snapedit", "-p", path.to_str().unwrap(), "shoe.jpg"]);
        assert!(cli.instruction.is_none());
        assert_eq!(cli.resolve_instruction().unwrap(), "instruction from file");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn preset_flag() {
        let cli = Cli::parse_from(["snapedit", "--preset", "clean-shadows", "shoe.jpg"]);
        assert_eq!(cli.preset, Some(Preset::CleanShadows));
        assert_eq!(cli.resolve_instruction().unwrap(), "Clean up shadows");
    }

    #[test]
    fn instruction_and_preset_conflict() {
        let result =
            Cli::try_parse_from(["snapedit", "--preset", "retro", "shoe.jpg", "make it pop"]);
        assert!(result.is_err());
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from(["snapedit", "shoe.jpg"]);
        assert!(cli.model.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.interactive);
        assert!(!cli.verbose);
        assert_eq!(cli.resolve_instruction().unwrap(), "");
    }

    #[test]
    fn all_options() {
        let cli = Cli::parse_from([
            "snapedit",
            "-m",
            "gpt-1",
            "-o",
            "out.png",
            "--config",
            "/tmp/c.toml",
            "-v",
            "shoe.jpg",
            "vivid colors",
        ]);
        assert_eq!(cli.model.as_deref(), Some("gpt-1"));
        assert_eq!(cli.output.as_deref(), Some("out.png"));
        assert_eq!(cli.config.as_deref(), Some("/tmp/c.toml"));
        assert!(cli.verbose);
        assert_eq!(cli.instruction.as_deref(), Some("vivid colors"));
    }

    #[test]
    fn interactive_needs_no_image() {
        let cli = Cli::parse_from(["snapedit", "-i"]);
        assert!(cli.interactive);
        assert!(cli.image.is_none());
    }
}
