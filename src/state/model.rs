/// Lifecycle of the page's single photo slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PhotoState {
    /// Nothing stored, or nothing attempted yet.
    #[default]
    Empty,
    /// A decoded image is on screen and its locator is stored.
    Loaded,
    /// The stored locator failed to resolve and has been cleared.
    Broken,
}

impl PhotoState {
    pub fn has_image(self) -> bool {
        matches!(self, Self::Loaded)
    }
}
