// LogPoller - core/region.rs
//
// The render seam. A display region is a single container whose content is
// replaced wholesale; the poller borrows it for one cycle at a time and never
// owns it.
//
// Implementations:
//   - `MemoryRegion` (here): in-memory, counts mutations; used by tests
//   - `ChannelRegion` (app::poll): the poll thread's mirror of what the UI
//     shows; forwards renders to the GUI thread
//   - `TerminalRegion` (app::headless): prints renders to a writer

use crate::util::error::RenderError;

/// A single UI container whose entire content is replaced on update.
pub trait DisplayRegion {
    /// The markup currently displayed.
    fn content(&self) -> Result<&str, RenderError>;

    /// Replace the displayed content with `markup` as its sole child.
    fn replace(&mut self, markup: &str) -> Result<(), RenderError>;
}

/// In-memory region that records how many times it was mutated.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegion {
    content: String,
    mutations: usize,
    detached: bool,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A region already displaying `markup` (zero mutations recorded).
    pub fn with_content(markup: impl Into<String>) -> Self {
        Self {
            content: markup.into(),
            ..Self::default()
        }
    }

    /// Number of `replace` calls that succeeded.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// Simulate the region being removed from its page.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn reattach(&mut self) {
        self.detached = false;
    }

    /// Displayed content, ignoring the detached flag.
    pub fn text(&self) -> &str {
        &self.content
    }
}

impl DisplayRegion for MemoryRegion {
    fn content(&self) -> Result<&str, RenderError> {
        if self.detached {
            return Err(RenderError::Detached {
                region: "memory".to_string(),
            });
        }
        Ok(&self.content)
    }

    fn replace(&mut self, markup: &str) -> Result<(), RenderError> {
        if self.detached {
            return Err(RenderError::Detached {
                region: "memory".to_string(),
            });
        }
        self.content.clear();
        self.content.push_str(markup);
        self.mutations += 1;
        Ok(())
    }
}
