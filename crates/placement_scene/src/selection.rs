//! Editor selection with multi-select modifiers
//!
//! - Click: Replace selection
//! - Shift+Click: Add to selection
//! - Ctrl+Click: Remove from selection
//! - Ctrl+Shift+Click: Toggle selection

use placement_session::ObjectHandle;

/// Selection mode based on modifier keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Replace,
    Add,
    Remove,
    Toggle,
}

impl SelectionMode {
    /// Determine selection mode from modifier keys.
    pub fn from_modifiers(shift: bool, ctrl: bool) -> Self {
        match (shift, ctrl) {
            (true, true) => Self::Toggle,
            (true, false) => Self::Add,
            (false, true) => Self::Remove,
            (false, false) => Self::Replace,
        }
    }
}

/// Ordered set of selected objects.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    /// In selection order
    selected: Vec<ObjectHandle>,
    /// Last selected object
    primary: Option<ObjectHandle>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<ObjectHandle> {
        self.primary
    }

    pub fn selected(&self) -> &[ObjectHandle] {
        &self.selected
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, handle: ObjectHandle) -> bool {
        self.selected.contains(&handle)
    }

    /// Select an object with the given mode.
    pub fn select(&mut self, handle: ObjectHandle, mode: SelectionMode) {
        match mode {
            SelectionMode::Replace => {
                self.selected.clear();
                self.selected.push(handle);
                self.primary = Some(handle);
            }
            SelectionMode::Add => {
                if !self.is_selected(handle) {
                    self.selected.push(handle);
                }
                self.primary = Some(handle);
            }
            SelectionMode::Remove => self.deselect(handle),
            SelectionMode::Toggle => {
                if self.is_selected(handle) {
                    self.deselect(handle);
                } else {
                    self.selected.push(handle);
                    self.primary = Some(handle);
                }
            }
        }
    }

    /// Replace the selection with `handles`.
    pub fn select_multiple(&mut self, handles: impl IntoIterator<Item = ObjectHandle>) {
        self.selected.clear();
        self.add_multiple(handles);
    }

    pub fn add_multiple(&mut self, handles: impl IntoIterator<Item = ObjectHandle>) {
        for handle in handles {
            if !self.is_selected(handle) {
                self.selected.push(handle);
            }
        }
        self.primary = self.selected.last().copied();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.primary = None;
    }

    /// Forget an object (e.g. when it is deleted).
    pub fn deselect(&mut self, handle: ObjectHandle) {
        self.selected.retain(|&h| h != handle);
        if self.primary == Some(handle) {
            self.primary = self.selected.last().copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(i: u32) -> ObjectHandle {
        ObjectHandle::new(i, 0)
    }

    #[test]
    fn test_selection_replace() {
        let mut sel = SelectionManager::new();
        sel.select(h(1), SelectionMode::Replace);
        sel.select(h(2), SelectionMode::Replace);

        assert_eq!(sel.count(), 1);
        assert!(sel.is_selected(h(2)));
        assert!(!sel.is_selected(h(1)));
    }

    #[test]
    fn test_selection_add_and_remove() {
        let mut sel = SelectionManager::new();
        sel.select(h(1), SelectionMode::Replace);
        sel.select(h(2), SelectionMode::from_modifiers(true, false));
        assert_eq!(sel.selected(), &[h(1), h(2)]);
        assert_eq!(sel.primary(), Some(h(2)));

        sel.select(h(2), SelectionMode::from_modifiers(false, true));
        assert_eq!(sel.selected(), &[h(1)]);
        assert_eq!(sel.primary(), Some(h(1)));
    }

    #[test]
    fn test_selection_toggle() {
        let mut sel = SelectionManager::new();
        sel.select(h(1), SelectionMode::Replace);
        sel.select(h(1), SelectionMode::Toggle);

        assert!(sel.is_empty());
        assert_eq!(sel.primary(), None);
    }

    #[test]
    fn test_select_multiple_dedups() {
        let mut sel = SelectionManager::new();
        sel.select_multiple([h(3), h(4), h(3)]);
        assert_eq!(sel.selected(), &[h(3), h(4)]);
        assert_eq!(sel.primary(), Some(h(4)));
    }
}
