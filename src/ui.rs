use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{block::Title, Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{EventKind, EventOutcome, RenderContext};
use tui_dispatch_components::centered_rect;

use crate::action::Action;
use crate::battle::{Battle, Direction};
use crate::dialog::{DialogBox, MOVE_SLOTS};
use crate::locale::{display_name, Localizer};
use crate::state::{AppState, GameMode};
use crate::unit::{BattleUnit, Side, Tint};

const BG_BASE: Color = Color::Rgb(24, 36, 26);
const BG_PANEL: Color = Color::Rgb(34, 58, 38);
const BG_PANEL_ALT: Color = Color::Rgb(28, 48, 32);
const TEXT_MAIN: Color = Color::Rgb(228, 236, 214);
const TEXT_DIM: Color = Color::Rgb(172, 186, 160);
const TEXT_DISABLED: Color = Color::Rgb(96, 108, 92);
const ACCENT_GREEN: Color = Color::Rgb(104, 204, 120);
const ACCENT_GOLD: Color = Color::Rgb(222, 196, 120);
const ACCENT_RED: Color = Color::Rgb(220, 96, 96);
const HIGHLIGHT_BG: Color = ACCENT_GREEN;
const HIGHLIGHT_TEXT: Color = Color::Rgb(16, 26, 18);
const BORDER_ACCENT: Color = Color::Rgb(74, 98, 82);

const HUD_WIDTH: u16 = 26;
const DETAIL_WIDTH: u16 = 16;
const ACTION_WIDTH: u16 = 12;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, _ctx: RenderContext) {
    render_screen(frame, area, state);
}

/// Draws the current mode without a render context.
pub fn render_screen(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
    match state.mode {
        GameMode::Overworld => render_ladder(frame, area, state),
        GameMode::Battle => match state.battle.as_ref() {
            Some(battle) => render_battle(frame, area, state, battle),
            None => render_ladder(frame, area, state),
        },
        GameMode::GameOver => render_game_over(frame, area, state),
    }
}

pub fn handle_event(event: &EventKind, state: &AppState) -> EventOutcome<Action> {
    match event {
        EventKind::Resize(width, height) => {
            EventOutcome::action(Action::UiTerminalResize(*width, *height)).with_render()
        }
        EventKind::Key(key) => handle_key(*key, state),
        _ => EventOutcome::ignored(),
    }
}

fn handle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return EventOutcome::action(Action::Quit);
    }
    match state.mode {
        GameMode::Overworld => handle_ladder_key(key, state),
        GameMode::Battle => handle_battle_key(key, state),
        GameMode::GameOver => handle_game_over_key(key),
    }
}

fn handle_ladder_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let count = state.trainers().len();
    if count == 0 {
        return EventOutcome::ignored();
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') => {
            let index = if state.selected == 0 {
                count - 1
            } else {
                state.selected - 1
            };
            EventOutcome::action(Action::LadderSelect(index))
        }
        KeyCode::Down | KeyCode::Char('s') => {
            let index = if state.selected + 1 >= count {
                0
            } else {
                state.selected + 1
            };
            EventOutcome::action(Action::LadderSelect(index))
        }
        KeyCode::Enter | KeyCode::Char('z') | KeyCode::Char('Z') => {
            EventOutcome::action(Action::LadderConfirm)
        }
        KeyCode::Char('l') | KeyCode::Char('L') => EventOutcome::action(Action::LanguageToggle),
        KeyCode::Esc => EventOutcome::action(Action::Quit),
        _ => EventOutcome::ignored(),
    }
}

/// Input reaches the battle only while it is waiting on the player.
fn handle_battle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let Some(battle) = state.battle.as_ref() else {
        return EventOutcome::ignored();
    };
    if !battle.accepts_input() {
        return EventOutcome::ignored();
    }
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('w') => Some(Action::BattleNavigate(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') => Some(Action::BattleNavigate(Direction::Down)),
        KeyCode::Left | KeyCode::Char('a') => Some(Action::BattleNavigate(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d') => Some(Action::BattleNavigate(Direction::Right)),
        KeyCode::Enter | KeyCode::Char('z') | KeyCode::Char('Z') => Some(Action::BattleConfirm),
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::BattleCancel),
        _ => None,
    };
    EventOutcome::from(action)
}

fn handle_game_over_key(key: KeyEvent) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => {
            EventOutcome::action(Action::Restart)
        }
        _ => EventOutcome::ignored(),
    }
}

fn render_ladder(frame: &mut Frame, area: Rect, state: &AppState) {
    let strings = &state.locales;
    let title = format!(" {} ", strings.localized_string("LADDER_TITLE"));
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(inner);

    let mut lines = vec![Line::from("")];
    for (index, trainer) in state.trainers().iter().enumerate() {
        let fighter = display_name(strings, &trainer.fighter.name);
        let mut label = format!(
            " {:<14} {:<10} Lvl {:<3}",
            trainer.name, fighter, trainer.fighter.level
        );
        if state.is_defeated(trainer) {
            label.push_str(&format!(" [{}]", strings.localized_string("DEFEATED")));
        }
        lines.push(menu_line(&label, index == state.selected));
    }
    frame.render_widget(Paragraph::new(Text::from(lines)), layout[0]);

    let message_block = panel_block("", BG_PANEL_ALT);
    let message_area = message_block.inner(layout[1]);
    frame.render_widget(message_block, layout[1]);
    let message = state.message.as_deref().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(text_lines(message))
            .style(Style::default().fg(TEXT_MAIN))
            .wrap(Wrap { trim: true }),
        message_area,
    );

    let hint = format!(
        "{}   [{}]",
        strings.localized_string("LADDER_HINT"),
        strings.localized_string("LANGUAGE")
    );
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(TEXT_DIM))),
        layout[2],
    );
}

fn render_battle(frame: &mut Frame, area: Rect, state: &AppState, battle: &Battle) {
    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(6),
        ])
        .split(area);

    let header = state.message.as_deref().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(
            header.replace('\n', " "),
            Style::default().fg(ACCENT_GOLD),
        )),
        layout[0],
    );

    let field = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);

    render_unit_panel(frame, field[0], state, &battle.enemy);
    render_unit_panel(frame, field[1], state, &battle.player);
    render_command_box(frame, layout[2], state, battle);
}

fn render_unit_panel(frame: &mut Frame, area: Rect, state: &AppState, unit: &BattleUnit) {
    let name = display_name(&state.locales, &unit.hud.name);
    let title = format!(" {} ", name.to_uppercase());
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Enemy: stats left, sprite right. Player: sprite left, stats right.
    let (hud_area, sprite_area) = match unit.side {
        Side::Enemy => {
            let split = Layout::default()
                .direction(LayoutDirection::Horizontal)
                .constraints([Constraint::Length(HUD_WIDTH), Constraint::Min(10)])
                .split(inner);
            (split[0], split[1])
        }
        Side::Player => {
            let split = Layout::default()
                .direction(LayoutDirection::Horizontal)
                .constraints([Constraint::Min(10), Constraint::Length(HUD_WIDTH)])
                .split(inner);
            (split[1], split[0])
        }
    };
    render_hud(frame, hud_area, &state.locales, unit);
    render_sprite(frame, sprite_area, unit);
}

fn render_hud(frame: &mut Frame, area: Rect, strings: &dyn Localizer, unit: &BattleUnit) {
    let hud = &unit.hud;
    let mut lines = vec![
        hp_line(hud.hp, hud.max_hp, hud.hp_ratio),
        Line::from(Span::styled(hud.level_label(), Style::default().fg(TEXT_DIM))),
    ];
    if unit.fighter.is_confused() {
        lines.push(Line::from(Span::styled(
            strings.localized_string("CONFUSED"),
            Style::default().fg(ACCENT_GOLD),
        )));
    }
    let paragraph = Paragraph::new(Text::from(lines)).style(Style::default().fg(TEXT_MAIN));
    frame.render_widget(paragraph, area);
}

fn render_sprite(frame: &mut Frame, area: Rect, unit: &BattleUnit) {
    let pose = unit.pose();
    let art = sprite_art(&unit.fighter.template.sprite);
    let art_width = art.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
    let art_height = art.len() as i32;

    let marks = unit.confusion_marks();
    if marks > 0 {
        let line = "? ".repeat(marks);
        frame.render_widget(
            Paragraph::new(Span::styled(
                line.trim_end().to_string(),
                Style::default().fg(ACCENT_GOLD).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            Rect::new(area.x, area.y, area.width, area.height.min(1)),
        );
    }

    if !pose.visible {
        return;
    }

    // dx points toward the opponent: right for the player, left for the enemy.
    let facing = match unit.side {
        Side::Player => 1,
        Side::Enemy => -1,
    };
    let rest_x = area.x as i32 + (area.width as i32 - art_width) / 2;
    let rest_y = area.y as i32 + (area.height as i32 - art_height).max(1);
    let x = (rest_x + facing * pose.dx as i32).max(area.x as i32);
    let y = (rest_y + pose.dy as i32).max(area.y as i32);
    let target = Rect::new(
        x as u16,
        y as u16,
        art_width.max(0) as u16,
        art_height.max(0) as u16,
    )
    .intersection(area);
    if target.area() == 0 {
        return;
    }

    let color = match pose.tint {
        Tint::None => match unit.side {
            Side::Player => ACCENT_GOLD,
            Side::Enemy => TEXT_MAIN,
        },
        Tint::Gray => TEXT_DISABLED,
        Tint::Green => ACCENT_GREEN,
        Tint::Red => ACCENT_RED,
    };
    let lines: Vec<Line> = art.iter().map(|row| Line::from(*row)).collect();
    frame.render_widget(
        Paragraph::new(Text::from(lines)).style(Style::default().fg(color)),
        target,
    );
}

fn render_command_box(frame: &mut Frame, area: Rect, state: &AppState, battle: &Battle) {
    let block = panel_block("", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dialog = &battle.dialog;
    let strings = &state.locales;

    if dialog.move_selector_visible {
        let split = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(DETAIL_WIDTH)])
            .split(inner);
        let mut lines = move_grid_lines(dialog);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            strings.localized_string("BATTLE_HINT"),
            Style::default().fg(TEXT_DIM),
        )));
        frame.render_widget(Paragraph::new(Text::from(lines)), split[0]);
        frame.render_widget(Paragraph::new(Text::from(detail_lines(dialog, strings))), split[1]);
        return;
    }

    let split = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(ACTION_WIDTH)])
        .split(inner);
    if dialog.text_visible {
        frame.render_widget(
            Paragraph::new(text_lines(&dialog.visible_text()))
                .style(Style::default().fg(TEXT_MAIN))
                .wrap(Wrap { trim: true }),
            split[0],
        );
    }
    if dialog.action_selector_visible {
        let lines = vec![
            menu_line(
                &format!(" {}", strings.localized_string("FIGHT")),
                dialog.selected_action == 0,
            ),
            menu_line(
                &format!(" {}", strings.localized_string("RUN")),
                dialog.selected_action == 1,
            ),
        ];
        frame.render_widget(Paragraph::new(Text::from(lines)), split[1]);
    }
}

fn move_grid_lines(dialog: &DialogBox) -> Vec<Line<'static>> {
    (0..MOVE_SLOTS)
        .step_by(2)
        .map(|row| {
            let spans: Vec<Span<'static>> = (row..row + 2)
                .map(|slot| {
                    let name = dialog.move_names.get(slot).cloned().unwrap_or_default();
                    let label = format!(" {:<14}", name.to_uppercase());
                    let style = if slot == dialog.selected_move {
                        Style::default()
                            .fg(HIGHLIGHT_TEXT)
                            .bg(HIGHLIGHT_BG)
                            .add_modifier(Modifier::BOLD)
                    } else if dialog.is_disabled(slot) {
                        Style::default().fg(TEXT_DISABLED)
                    } else {
                        Style::default().fg(TEXT_MAIN)
                    };
                    Span::styled(label, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn detail_lines(dialog: &DialogBox, strings: &dyn Localizer) -> Vec<Line<'static>> {
    let Some(details) = dialog.details.as_ref() else {
        return Vec::new();
    };
    let pp_color = if details.pp <= 0 {
        ACCENT_RED
    } else {
        TEXT_MAIN
    };
    vec![
        Line::from(Span::styled(details.pp_label(), Style::default().fg(pp_color))),
        Line::from(Span::styled(
            format!(
                "{}/{}",
                strings.localized_string("TYPE"),
                display_name(strings, details.category.label())
            ),
            Style::default().fg(TEXT_DIM),
        )),
    ]
}

fn render_game_over(frame: &mut Frame, area: Rect, state: &AppState) {
    let modal = centered_rect(50, 8, area);
    let block = panel_block("", BG_PANEL);
    let inner = block.inner(modal);
    frame.render_widget(block, modal);

    let mut lines = vec![
        Line::from(Span::styled(
            state.locales.localized_string("GAME_OVER_TITLE"),
            Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(text_lines(state.message.as_deref().unwrap_or_default()).lines);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT_MAIN)),
        inner,
    );
}

fn text_lines(text: &str) -> Text<'static> {
    Text::from(
        text.lines()
            .map(|line| Line::from(line.to_string()))
            .collect::<Vec<_>>(),
    )
}

fn hp_line(current: i32, max: i32, ratio: f32) -> Line<'static> {
    let width: usize = 12;
    let filled = ((ratio * width as f32).round() as usize).min(width);
    let empty = width.saturating_sub(filled);
    let color = if ratio > 0.5 {
        ACCENT_GREEN
    } else if ratio > 0.2 {
        ACCENT_GOLD
    } else {
        ACCENT_RED
    };
    Line::from(vec![
        Span::raw("HP "),
        Span::styled(
            "█".repeat(filled),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled("░".repeat(empty), Style::default().fg(TEXT_DIM)),
        Span::raw(format!(" {}/{}", current.max(0), max)),
    ])
}

fn panel_block<'a, T>(title: T, bg: Color) -> Block<'a>
where
    T: Into<Title<'a>>,
{
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .style(Style::default().bg(bg).fg(TEXT_MAIN))
        .border_style(Style::default().fg(BORDER_ACCENT))
}

fn menu_line(label: &str, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default()
            .fg(HIGHLIGHT_TEXT)
            .bg(HIGHLIGHT_BG)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_MAIN)
    };
    Line::from(Span::styled(label.to_string(), style))
}

fn sprite_art(key: &str) -> &'static [&'static str] {
    match key {
        "sparkit" => &[
            "  /\\_/\\  ",
            " ( ^.^ )~",
            "  > * <  ",
            "  /   \\  ",
        ],
        "pebblor" => &[
            "  _____  ",
            " / o o \\ ",
            "|  ___  |",
            " \\_____/ ",
        ],
        "mindlet" => &[
            "   .-.   ",
            "  (@ @)  ",
            "  /)~(\\  ",
            "   ^ ^   ",
        ],
        "flarepup" => &[
            "   ) )   ",
            " /\\_/\\(  ",
            "( o.o )  ",
            " (___)~  ",
        ],
        "psyowl" => &[
            "  {o,o}  ",
            "  /)_)   ",
            "  -\"-\"- ",
            "   ` `   ",
        ],
        _ => &[
            "  .---.  ",
            " ( ? ? ) ",
            "  `---'  ",
        ],
    }
}
