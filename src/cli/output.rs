//! Colored terminal output for packaging runs.

use crate::{error::Stage, packager::PackagedImage};
use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(quiet: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            quiet,
        }
    }

    fn emit(&self, marker: &str, color: Color, bold: bool, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.stdout.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = write!(&mut buffer, "{marker}");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, " {message}");
        let _ = self.stdout.print(&buffer);
    }

    /// Announce the start of a pipeline stage
    pub fn stage(&self, stage: Stage) {
        let message = match stage {
            Stage::Validate => "Checking inputs",
            Stage::Stage => "Staging application bundle",
            Stage::Sign => "Signing application bundle",
            Stage::Augment => "Adding Applications link and license",
            Stage::BuildImage => "Building disk image",
        };
        self.emit("⋯", Color::Magenta, false, message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        self.emit("ℹ", Color::Cyan, false, message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.emit("✓", Color::Green, true, message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.emit("⚠", Color::Yellow, true, message);
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer, "    {message}");
        let _ = self.stdout.print(&buffer);
    }

    /// Summarize a finished image
    pub fn image(&self, image: &PackagedImage) {
        self.success(&format!("Created {}", image.path.display()));
        self.indent(&format!("size:   {} bytes", image.size));
        self.indent(&format!("sha256: {}", image.checksum));
        self.indent(&format!("signed: {}", if image.signed { "yes" } else { "no" }));
        if let Some(cleanup) = &image.cleanup_error {
            self.warn(&format!("Staging root was not removed: {cleanup}"));
        }
    }

    /// Print an error message (always shown, on stderr)
    pub fn error(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = stderr.buffer();

        if buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true)).is_err()
            || write!(&mut buffer, "✗").is_err()
            || buffer.reset().is_err()
            || writeln!(&mut buffer, " {message}").is_err()
            || stderr.print(&buffer).is_err()
        {
            println!("[STDERR ERROR] ✗ {message}");
        }
    }

    /// Print an indented line on stderr (always shown)
    pub fn error_detail(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = stderr.buffer();
        let _ = writeln!(&mut buffer, "    {message}");
        let _ = stderr.print(&buffer);
    }
}
