use serde::{Deserialize, Serialize};

use crate::battle::Direction;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,
    UiTerminalResize(u16, u16),
    Tick,

    // Trainer ladder
    LadderSelect(usize),
    LadderConfirm,
    LanguageToggle,

    // Battle input
    BattleNavigate(Direction),
    BattleConfirm,
    BattleCancel,

    // Battle timers
    BattleResume { ticket: u64 },
    DialogLetter { ticket: u64 },

    Restart,
    Quit,
}
