use crate::client::AppSnapshot;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;
use torii_client::{
    Erc20Token,
    Erc721Token,
};

pub enum UserEvent {
    Quit,
    MintCharacter,
    CashFaucet,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // Single persistent Terminal so buffers survive across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<Event>;

/// Forward crossterm events from a blocking reader thread so the app loop
/// can select over them alongside indexer updates.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(?err, "reading terminal input failed");
                    break;
                }
            }
        }
    });
    rx
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    events
        .recv()
        .await
        .ok_or_else(|| eyre!("input event stream closed"))
}

pub fn interpret_event(_state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) => key,
        Event::Resize(_, _) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
        KeyCode::Char('m') => Some(UserEvent::MintCharacter),
        KeyCode::Char('f') => Some(UserEvent::CashFaucet),
        _ => None,
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    draw_with(&mut state.terminal, snap)
}

/// The terminal goes back into the slot even when a draw errors, so a
/// transient failure does not turn every later draw into a no-op.
fn draw_with<B: Backend>(
    terminal: &mut Option<Terminal<B>>,
    snap: &AppSnapshot,
) -> Result<()> {
    if let Some(mut term) = terminal.take() {
        let res = term.draw(|f| ui(f, snap)).map(|_| ());
        *terminal = Some(term);
        res?;
    }
    Ok(())
}

fn ui(frame: &mut Frame, snap: &AppSnapshot) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(frame.area());

    frame.render_widget(header(snap), chunks[0]);
    render_tokens(frame, snap, chunks[1]);
    frame.render_widget(status_panel(snap), chunks[2]);
    frame.render_widget(footer(snap), chunks[3]);
}

fn header(snap: &AppSnapshot) -> Paragraph<'static> {
    let account = match snap.account_address {
        Some(address) => format!("account {address:#x}"),
        None => "view-only (no account)".to_string(),
    };
    let minted = match snap.minted_count {
        Some(count) => format!("characters minted: {count}"),
        None => "characters minted: ?".to_string(),
    };
    Paragraph::new(format!("{account}    {minted}"))
        .block(Block::bordered().title("Example World"))
}

fn render_tokens(frame: &mut Frame, snap: &AppSnapshot, area: Rect) {
    let halves =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

    let characters: Vec<ListItem> = snap
        .tokens
        .erc721
        .iter()
        .map(|token| ListItem::new(erc721_line(token)))
        .collect();
    frame.render_widget(
        List::new(characters).block(Block::bordered().title("Characters")),
        halves[0],
    );

    let coins: Vec<ListItem> = snap
        .tokens
        .erc20
        .iter()
        .map(|token| ListItem::new(erc20_line(token)))
        .collect();
    frame.render_widget(
        List::new(coins).block(Block::bordered().title("Coins")),
        halves[1],
    );
}

fn status_panel(snap: &AppSnapshot) -> Paragraph<'static> {
    let line = match snap.errors.last() {
        Some(error) => Line::from(error.clone()).style(Style::new().fg(Color::Red)),
        None => Line::from(snap.status.clone()),
    };
    Paragraph::new(line).block(Block::bordered().title("Status"))
}

fn footer(snap: &AppSnapshot) -> Paragraph<'static> {
    let hints = if snap.can_act {
        "[m] mint character   [f] cash faucet   [q] quit"
    } else {
        "[q] quit   (pass --account to enable actions)"
    };
    Paragraph::new(hints).style(Style::new().fg(Color::DarkGray))
}

fn erc721_line(token: &Erc721Token) -> String {
    if token.token_ids.is_empty() {
        format!("{}: {}", token.symbol, token.count)
    } else {
        format!(
            "{}: {} ({})",
            token.symbol,
            token.count,
            token.token_ids.iter().map(|id| id.to_string()).join(", ")
        )
    }
}

fn erc20_line(token: &Erc20Token) -> String {
    format!("{}: {}", token.symbol, token.adjusted_balance)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use ratatui::{
        backend::{
            TestBackend,
            WindowSize,
        },
        buffer::Cell,
        layout::{
            Position,
            Size,
        },
    };
    use starknet::core::types::Felt;

    /// Delegates to a [`TestBackend`] but fails every flush, which makes
    /// `Terminal::draw` error after rendering.
    struct FailingBackend(TestBackend);

    impl Backend for FailingBackend {
        fn draw<'a, I>(&mut self, content: I) -> std::io::Result<()>
        where
            I: Iterator<Item = (u16, u16, &'a Cell)>,
        {
            self.0.draw(content)
        }

        fn hide_cursor(&mut self) -> std::io::Result<()> {
            self.0.hide_cursor()
        }

        fn show_cursor(&mut self) -> std::io::Result<()> {
            self.0.show_cursor()
        }

        fn get_cursor_position(&mut self) -> std::io::Result<Position> {
            self.0.get_cursor_position()
        }

        fn set_cursor_position<P: Into<Position>>(
            &mut self,
            position: P,
        ) -> std::io::Result<()> {
            self.0.set_cursor_position(position)
        }

        fn clear(&mut self) -> std::io::Result<()> {
            self.0.clear()
        }

        fn size(&self) -> std::io::Result<Size> {
            self.0.size()
        }

        fn window_size(&mut self) -> std::io::Result<WindowSize> {
            self.0.window_size()
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("flush failed"))
        }
    }

    fn snapshot() -> AppSnapshot {
        AppSnapshot {
            account_address: None,
            minted_count: Some(1),
            tokens: Default::default(),
            can_act: false,
            status: "Ready".to_string(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn draw_with__renders_and_keeps_terminal() {
        // given
        let mut terminal = Some(Terminal::new(TestBackend::new(80, 24)).unwrap());

        // when
        draw_with(&mut terminal, &snapshot()).unwrap();

        // then
        assert!(terminal.is_some());
    }

    #[test]
    fn draw_with__failing_draw__keeps_terminal_for_later_draws() {
        // given a terminal whose backend errors on flush
        let backend = FailingBackend(TestBackend::new(80, 24));
        let mut terminal = Some(Terminal::new(backend).unwrap());

        // when
        let res = draw_with(&mut terminal, &snapshot());

        // then the error propagates but the terminal survives
        assert!(res.is_err());
        assert!(terminal.is_some());
    }

    #[test]
    fn draw_with__no_terminal__is_a_noop() {
        let mut terminal: Option<Terminal<TestBackend>> = None;
        draw_with(&mut terminal, &snapshot()).unwrap();
        assert!(terminal.is_none());
    }

    #[test]
    fn erc721_line__lists_ids_in_order() {
        let token = Erc721Token {
            name: "Character".to_string(),
            symbol: "CHAR".to_string(),
            decimals: 0,
            contract_address: Felt::TWO,
            count: 2,
            token_ids: vec![BigUint::from(4u8), BigUint::from(9u8)],
        };
        assert_eq!(erc721_line(&token), "CHAR: 2 (4, 9)");
    }

    #[test]
    fn erc721_line__without_ids__shows_count_only() {
        let token = Erc721Token {
            name: "Character".to_string(),
            symbol: "CHAR".to_string(),
            decimals: 0,
            contract_address: Felt::TWO,
            count: 1,
            token_ids: Vec::new(),
        };
        assert_eq!(erc721_line(&token), "CHAR: 1");
    }

    #[test]
    fn erc20_line__shows_adjusted_balance() {
        let token = Erc20Token {
            name: "Cash".to_string(),
            symbol: "CASH".to_string(),
            decimals: 2,
            contract_address: Felt::ONE,
            balance: BigUint::from(1500u32),
            adjusted_balance: BigUint::from(15u8),
        };
        assert_eq!(erc20_line(&token), "CASH: 15");
    }
}
