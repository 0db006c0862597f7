use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

pub static GLOBAL_MP: Lazy<MultiProgress> = Lazy::new(MultiProgress::new);

/// Routes log lines through the `MultiProgress` so they print above any
/// active bars instead of tearing them.
pub struct MultiProgressWriter {
    mp: Arc<MultiProgress>,
}

impl MultiProgressWriter {
    pub fn new(mp: Arc<MultiProgress>) -> Self {
        Self { mp }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        self.mp.println(line.trim_end_matches('\n'))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // MultiProgress writes through on println
        Ok(())
    }
}

pub fn create_spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = GLOBAL_MP.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["◜", "◠", "◝", "◞", "◡", "◟"])
            .template("{spinner:.cyan} {msg}")
            .expect("progress style error"),
    );
    pb.set_message(message);
    pb
}

pub fn create_bytes_progress(message: impl Into<Cow<'static, str>>, total: u64) -> ProgressBar {
    let pb = GLOBAL_MP.add(ProgressBar::new(total));
    pb.set_style(
        ProgressStyle::default_bar()
            .progress_chars("##-")
            .template("{msg}\n{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
            .expect("progress style error"),
    );
    pb.set_message(message);
    pb
}
