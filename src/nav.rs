use crate::geometry::SceneKind;

/// One clickable row of the navigation panel, in terminal cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavRow {
    pub kind: SceneKind,
    pub label: String,
    pub col: u16,
    pub row: u16,
}

impl NavRow {
    fn width(&self) -> u16 {
        self.label.chars().count() as u16
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col + self.width()
    }
}

/// Page list shown while the artifact is open. It only follows the
/// artifact's open state and never changes it.
#[derive(Clone, Debug)]
pub struct NavPanel {
    current: SceneKind,
    visible: bool,
    rows: Vec<NavRow>,
}

impl NavPanel {
    pub fn new(current: SceneKind) -> Self {
        NavPanel {
            current,
            visible: false,
            rows: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn current(&self) -> SceneKind {
        self.current
    }

    pub fn set_current(&mut self, kind: SceneKind) {
        self.current = kind;
    }

    /// Shows or hides the panel and lays it out for a `cols`x`rows` terminal,
    /// centered horizontally in the lower part of the screen
    pub fn sync(&mut self, open: bool, cols: u16, rows: u16) {
        self.visible = open;
        if !open {
            self.rows.clear();
            return;
        }
        let top = (rows as u32 * 3 / 4) as u16;
        self.rows = SceneKind::ALL
            .iter()
            .enumerate()
            .filter_map(|(i, &kind)| {
                let marker = if kind == self.current { '>' } else { ' ' };
                let label = format!("{marker} {} ", kind.name().to_uppercase());
                let width = label.chars().count() as u16;
                let row = top + i as u16;
                (row < rows).then(|| NavRow {
                    kind,
                    col: cols.saturating_sub(width) / 2,
                    row,
                    label,
                })
            })
            .collect();
    }

    pub fn rows(&self) -> &[NavRow] {
        &self.rows
    }

    /// The page whose link sits under the given cell
    pub fn hit(&self, col: u16, row: u16) -> Option<SceneKind> {
        if !self.visible {
            return None;
        }
        self.rows.iter().find(|r| r.contains(col, row)).map(|r| r.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_panel_has_no_links() {
        let mut nav = NavPanel::new(SceneKind::Urban);
        nav.sync(false, 80, 24);
        assert!(!nav.is_visible());
        assert!(nav.rows().is_empty());
        assert_eq!(nav.hit(40, 18), None);
    }

    #[test]
    fn test_open_panel_lists_every_page() {
        let mut nav = NavPanel::new(SceneKind::Rural);
        nav.sync(true, 80, 24);
        assert_eq!(nav.rows().len(), 4);
        let rural = &nav.rows()[1];
        assert!(rural.label.starts_with('>'));
        assert_eq!(nav.hit(rural.col, rural.row), Some(SceneKind::Rural));
        assert_eq!(nav.hit(0, rural.row), None);
    }

    #[test]
    fn test_rows_past_the_bottom_are_dropped() {
        let mut nav = NavPanel::new(SceneKind::Urban);
        nav.sync(true, 40, 6);
        assert!(nav.rows().iter().all(|r| r.row < 6));
        assert!(nav.rows().len() < 4);
    }
}
