//! "Show all" windows for home-page list sections.
//!
//! A window shows the first N items in source order and hides the rest
//! until the visitor expands it. Expanding is one-way. Sections with a
//! different count on narrow screens carry both limits; the hidden markers
//! are emitted per breakpoint and resolved in CSS.

/// How many items a section shows before the "show all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPolicy {
    pub mobile: usize,
    pub desktop: usize,
}

impl DisplayPolicy {
    pub const fn uniform(count: usize) -> Self {
        Self {
            mobile: count,
            desktop: count,
        }
    }
}

pub const NEWS_POLICY: DisplayPolicy = DisplayPolicy::uniform(5);
pub const AWARDS_POLICY: DisplayPolicy = DisplayPolicy::uniform(5);
pub const TALKS_POLICY: DisplayPolicy = DisplayPolicy::uniform(5);
pub const PROJECTS_POLICY: DisplayPolicy = DisplayPolicy {
    mobile: 4,
    desktop: 3,
};
pub const PUBLICATIONS_POLICY: DisplayPolicy = DisplayPolicy::uniform(6);

#[derive(Debug, Clone)]
pub struct WindowItem<T> {
    pub item: T,
    pub hidden_on_mobile: bool,
    pub hidden_on_desktop: bool,
}

impl<T> WindowItem<T> {
    /// Space-separated marker classes, empty when always visible.
    pub fn hidden_class(&self) -> &'static str {
        match (self.hidden_on_mobile, self.hidden_on_desktop) {
            (true, true) => "window-hidden",
            (true, false) => "window-hidden-mobile",
            (false, true) => "window-hidden-desktop",
            (false, false) => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListWindow<T> {
    items: Vec<WindowItem<T>>,
    policy: DisplayPolicy,
    expanded: bool,
}

impl<T> ListWindow<T> {
    pub fn new(items: Vec<T>, policy: DisplayPolicy) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| WindowItem {
                item,
                hidden_on_mobile: index >= policy.mobile,
                hidden_on_desktop: index >= policy.desktop,
            })
            .collect();
        Self {
            items,
            policy,
            expanded: false,
        }
    }

    pub fn expand(&mut self) {
        self.expanded = true;
        for entry in &mut self.items {
            entry.hidden_on_mobile = false;
            entry.hidden_on_desktop = false;
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn entries(&self) -> &[WindowItem<T>] {
        &self.items
    }

    /// Items visible at the desktop breakpoint.
    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .filter(|entry| !entry.hidden_on_desktop)
            .map(|entry| &entry.item)
    }

    pub fn control_on_mobile(&self) -> bool {
        !self.expanded && self.items.len() > self.policy.mobile
    }

    pub fn control_on_desktop(&self) -> bool {
        !self.expanded && self.items.len() > self.policy.desktop
    }

    pub fn shows_control(&self) -> bool {
        self.control_on_mobile() || self.control_on_desktop()
    }

    /// Marker class for the control, mirroring [`WindowItem::hidden_class`].
    pub fn control_class(&self) -> &'static str {
        match (self.control_on_mobile(), self.control_on_desktop()) {
            (true, true) | (false, false) => "",
            (true, false) => "window-control-mobile",
            (false, true) => "window-control-desktop",
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ListWindow<U> {
        ListWindow {
            items: self
                .items
                .into_iter()
                .map(|entry| WindowItem {
                    item: f(entry.item),
                    hidden_on_mobile: entry.hidden_on_mobile,
                    hidden_on_desktop: entry.hidden_on_desktop,
                })
                .collect(),
            policy: self.policy,
            expanded: self.expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_lists_show_the_first_items_and_a_control() {
        let window = ListWindow::new((1..=12).collect(), NEWS_POLICY);
        assert_eq!(window.visible().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(window.shows_control());
    }

    #[test]
    fn expanding_reveals_everything_and_drops_the_control() {
        let mut window = ListWindow::new((1..=12).collect::<Vec<i32>>(), NEWS_POLICY);
        window.expand();
        assert_eq!(window.visible().count(), 12);
        assert!(!window.shows_control());
        assert!(window.is_expanded());
    }

    #[test]
    fn short_lists_have_no_control() {
        let window = ListWindow::new(vec![1, 2, 3, 4], NEWS_POLICY);
        assert_eq!(window.visible().count(), 4);
        assert!(!window.shows_control());
    }

    #[test]
    fn projects_hide_per_breakpoint() {
        let window = ListWindow::new(vec!['a', 'b', 'c', 'd', 'e'], PROJECTS_POLICY);
        let classes: Vec<_> = window.entries().iter().map(WindowItem::hidden_class).collect();
        assert_eq!(
            classes,
            vec!["", "", "", "window-hidden-desktop", "window-hidden"]
        );
        assert_eq!(window.control_class(), "");

        let four = ListWindow::new(vec!['a', 'b', 'c', 'd'], PROJECTS_POLICY);
        assert_eq!(four.control_class(), "window-control-desktop");
    }
}
