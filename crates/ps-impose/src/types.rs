use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImposeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("I/O error in {section}")]
    Section {
        section: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error seeking page {0}")]
    SeekPage(usize),
    #[error("bad page label while seeking page {0}")]
    PageLabel(usize),
    #[error("I/O error reading page setup {0}")]
    ReadPageSetup(usize),
    #[error("I/O error writing page {0}")]
    WritePage(usize),
    #[error("page specification error: {0}")]
    Spec(String),
    #[error("bad dimension: {0}")]
    Dimension(String),
    #[error("{0} not set")]
    Unset(&'static str),
    #[error("paper size '{0}' not recognised")]
    Paper(String),
    #[error("invalid page range: {0}")]
    Range(String),
    #[error("can't find acceptable layout for {0}-up")]
    Layout(usize),
    #[error("paper margins are too large")]
    MarginsTooLarge,
}

impl ImposeError {
    /// Attach the document section being copied to an I/O failure.
    pub(crate) fn section(section: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| ImposeError::Section { section, source }
    }
}

pub type Result<T> = std::result::Result<T, ImposeError>;

/// A width and height in PostScript points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dims {
    pub width: f64,
    pub height: f64,
}

impl Dims {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The same sheet with width and height exchanged.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}
