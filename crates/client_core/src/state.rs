/// Load phase shared by the controllers. A resync moves `Ready` back to
/// `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Errored,
}

impl LoadState {
    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }
}
