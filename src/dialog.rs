//! The battle's text box: typed dialog, the action list and the move grid.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fighter::{Move, MoveCategory};
use crate::locale::{display_name, Localizer};

pub const MOVE_SLOTS: usize = 4;
pub const EMPTY_SLOT: &str = "-";
pub const ACTION_COUNT: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MoveDetails {
    pub pp: i32,
    pub max_pp: i32,
    pub category: MoveCategory,
}

impl MoveDetails {
    pub fn pp_label(&self) -> String {
        format!("PP {}/{}", self.pp, self.max_pp)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DialogBox {
    text: String,
    shown: usize,
    writing: bool,
    pub text_visible: bool,
    pub action_selector_visible: bool,
    pub move_selector_visible: bool,
    pub selected_action: usize,
    pub selected_move: usize,
    pub move_names: Vec<String>,
    /// Disabled move slots in the order they were disabled.
    pub disabled: Vec<usize>,
    pub details: Option<MoveDetails>,
}

impl Default for DialogBox {
    fn default() -> Self {
        Self {
            text: String::new(),
            shown: 0,
            writing: false,
            text_visible: true,
            action_selector_visible: false,
            move_selector_visible: false,
            selected_action: 0,
            selected_move: 0,
            move_names: vec![EMPTY_SLOT.to_string(); MOVE_SLOTS],
            disabled: Vec::new(),
            details: None,
        }
    }
}

impl DialogBox {
    pub fn is_writing(&self) -> bool {
        self.writing
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// The part of the current line revealed so far.
    pub fn visible_text(&self) -> String {
        self.text.chars().take(self.shown).collect()
    }

    /// Starts typing `line` and reveals its first character.
    ///
    /// Returns `false` without touching the box when a line is already
    /// being typed. An empty line completes immediately.
    pub fn begin_line(&mut self, line: String) -> bool {
        if self.writing {
            return false;
        }
        let empty = line.is_empty();
        self.text = line;
        self.shown = if empty { 0 } else { 1 };
        self.writing = !empty;
        true
    }

    /// Advances typing by one character. Returns `true` while the line is
    /// still being written.
    pub fn reveal_next(&mut self) -> bool {
        if !self.writing {
            return false;
        }
        let total = self.text.chars().count();
        if self.shown < total {
            self.shown += 1;
            return true;
        }
        self.writing = false;
        false
    }

    /// Fills the four move slots and clears every disabled mark.
    pub fn set_move_names(&mut self, moves: &[Move], strings: &dyn Localizer) {
        self.disabled.clear();
        self.move_names = (0..MOVE_SLOTS)
            .map(|slot| match moves.get(slot) {
                Some(mv) => display_name(strings, mv.name()),
                None => EMPTY_SLOT.to_string(),
            })
            .collect();
    }

    pub fn enable_dialog_text(&mut self, enable: bool) {
        self.text_visible = enable;
    }

    pub fn enable_action_selector(&mut self, enable: bool) {
        self.action_selector_visible = enable;
    }

    /// The move grid and its details pane toggle together.
    pub fn enable_move_selector(&mut self, enable: bool) {
        self.move_selector_visible = enable;
    }

    pub fn update_action_selection(&mut self, selected: usize) {
        self.selected_action = selected.min(ACTION_COUNT - 1);
    }

    pub fn update_move_selection(&mut self, selected: usize, mv: &Move) {
        self.selected_move = selected;
        self.details = Some(MoveDetails {
            pp: mv.pp,
            max_pp: mv.template.max_pp,
            category: mv.category(),
        });
    }

    pub fn disable_move(&mut self, slot: usize) {
        if slot >= MOVE_SLOTS {
            tracing::warn!(slot, "move slot out of range, not disabled");
            return;
        }
        if !self.disabled.contains(&slot) {
            self.disabled.push(slot);
        }
    }

    pub fn is_disabled(&self, slot: usize) -> bool {
        self.disabled.contains(&slot)
    }

    /// True when every slot holding one of the fighter's `move_count` moves
    /// is disabled.
    pub fn all_moves_disabled(&self, move_count: usize) -> bool {
        (0..move_count.min(MOVE_SLOTS)).all(|slot| self.is_disabled(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fighter::MoveTemplate;
    use crate::locale::StringTable;
    use pretty_assertions::assert_eq;

    fn mv(name: &str, pp: i32) -> Move {
        let mut mv = Move::new(MoveTemplate {
            name: name.to_string(),
            category: MoveCategory::Psychic,
            power: 50,
            accuracy: 100,
            max_pp: 10,
            description: String::new(),
        });
        mv.pp = pp;
        mv
    }

    #[test]
    fn typing_reveals_one_character_per_step() {
        let mut dialog = DialogBox::default();
        assert!(dialog.begin_line("Hey".to_string()));
        assert_eq!(dialog.visible_text(), "H");
        assert!(dialog.reveal_next());
        assert!(dialog.reveal_next());
        assert_eq!(dialog.visible_text(), "Hey");
        assert!(dialog.is_writing());
        assert!(!dialog.reveal_next());
        assert!(!dialog.is_writing());
    }

    #[test]
    fn second_line_while_typing_is_ignored() {
        let mut dialog = DialogBox::default();
        dialog.begin_line("first".to_string());
        assert!(!dialog.begin_line("second".to_string()));
        assert_eq!(dialog.full_text(), "first");
    }

    #[test]
    fn empty_line_completes_immediately() {
        let mut dialog = DialogBox::default();
        assert!(dialog.begin_line(String::new()));
        assert!(!dialog.is_writing());
    }

    #[test]
    fn move_names_fall_back_and_pad() {
        let strings = StringTable::default();
        let mut dialog = DialogBox::default();
        dialog.disable_move(0);
        dialog.set_move_names(&[mv("confuse_ray", 3), mv("tackle", 3)], &strings);
        assert_eq!(dialog.move_names, vec!["confuse_ray", "tackle", "-", "-"]);
        assert!(dialog.disabled.is_empty());
    }

    #[test]
    fn disabled_moves_keep_order_without_duplicates() {
        let mut dialog = DialogBox::default();
        dialog.disable_move(2);
        dialog.disable_move(0);
        dialog.disable_move(2);
        dialog.disable_move(9);
        assert_eq!(dialog.disabled, vec![2, 0]);
        assert!(!dialog.all_moves_disabled(3));
        dialog.disable_move(1);
        assert!(dialog.all_moves_disabled(3));
    }

    #[test]
    fn move_details_show_pp_and_category() {
        let mut dialog = DialogBox::default();
        dialog.update_move_selection(1, &mv("psybeam", 4));
        let details = dialog.details.clone().expect("details set");
        assert_eq!(details.pp_label(), "PP 4/10");
        assert_eq!(details.category.label(), "PSYCHIC");
        assert_eq!(dialog.selected_move, 1);
    }
}
