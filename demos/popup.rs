//! Popup Example - Bottom sheet over a scrolling page
//!
//! Demonstrates:
//! - Lazy content render on first open
//! - Two-way binding through a signal
//! - Overlay tap to dismiss (drags are ignored)
//! - Close icon
//! - Scroll lock swallowing background wheel events
//!
//! Keys: `o` open, `t` toggle teleport, `q` quit.
//! Logs go to stderr: `RUST_LOG=spark_popup=debug cargo run --example popup 2>log.txt`
//!
//! Run with: cargo run --example popup

use std::cell::Cell;
use std::io::{stdout, Write};
use std::rc::Rc;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue, style::Print};
use spark_signals::signal;
use tracing_subscriber::EnvFilter;

use spark_popup::state::input::{self, InputEvent};
use spark_popup::state::mouse::{self, fill_hit_rect, resize_hit_grid};
use spark_popup::state::scroll_lock::{is_locked, lock_count};
use spark_popup::{
    box_primitive, flush, get_index, popup, BoxProps, Popup, PopupProps, Position, Teleport,
};

const SHEET_HEIGHT: u16 = 8;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let scroll = Rc::new(Cell::new(0u16));
    let s = scroll.clone();
    let _scroll = mouse::on_scroll(move |event| {
        if let Some(info) = event.scroll {
            let delta = info.delta;
            match info.direction {
                mouse::ScrollDirection::Down => s.set(s.get().saturating_add(delta)),
                mouse::ScrollDirection::Up => s.set(s.get().saturating_sub(delta)),
                _ => {}
            }
        }
        true
    });

    let _page = box_primitive(BoxProps {
        id: Some("page".into()),
        children: Some(Box::new(|| {
            box_primitive(BoxProps {
                id: Some("portal".into()),
                class: Some("portal".into()),
                ..Default::default()
            });
        })),
        ..Default::default()
    });

    let show = signal(false);
    let sheet = popup(PopupProps {
        position: Position::Bottom,
        round: true,
        closeable: true,
        children: Some(Box::new(|| {
            box_primitive(BoxProps {
                id: Some("sheet-content".into()),
                ..Default::default()
            });
        })),
        ..PopupProps::model(show.clone())
    });

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    input::enable_mouse()?;

    let result = run(&sheet, &show, &scroll);

    input::disable_mouse()?;
    execute!(stdout(), Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

fn run(sheet: &Popup, show: &spark_signals::Signal<bool>, scroll: &Cell<u16>) -> std::io::Result<()> {
    let (mut width, mut height) = size()?;
    resize_hit_grid(width, height);
    let mut teleported = false;

    loop {
        if let Some(event) = input::poll_event(Duration::from_millis(16))? {
            match event {
                InputEvent::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('o') => {
                        show.set(true);
                    }
                    KeyCode::Char('t') => {
                        teleported = !teleported;
                        sheet.set_teleport(if teleported {
                            Teleport::Selector("#portal".into())
                        } else {
                            Teleport::None
                        });
                    }
                    _ => {}
                },
                InputEvent::Resize(w, h) => {
                    width = w;
                    height = h;
                    input::route_event(event);
                }
                other => {
                    input::route_event(other);
                }
            }
        }

        flush();
        draw(sheet, scroll.get(), width, height)?;
    }
    Ok(())
}

/// Paint the page, then the overlay, then the sheet (back to front).
fn draw(sheet: &Popup, scroll: u16, width: u16, height: u16) -> std::io::Result<()> {
    let mut out = stdout();
    queue!(out, Clear(ClearType::All))?;
    mouse::clear_hit_grid();

    if let Some(page) = get_index("page") {
        fill_hit_rect(0, 0, width, height, page);
    }
    for row in 0..height.saturating_sub(1) {
        queue!(out, MoveTo(0, row), Print(format!("page line {}", row + scroll)))?;
    }
    queue!(
        out,
        MoveTo(0, height.saturating_sub(1)),
        Print(format!(
            "[o] open  [t] teleport  [q] quit   visible={} locked={} holders={}",
            sheet.is_visible(),
            is_locked(),
            lock_count()
        ))
    )?;

    if sheet.overlay_visible() {
        if let Some(overlay) = sheet.overlay_node() {
            fill_hit_rect(0, 0, width, height, overlay);
        }
    }

    if sheet.is_visible() {
        let top = height.saturating_sub(SHEET_HEIGHT + 1);
        if let Some(root) = sheet.root_node() {
            fill_hit_rect(0, top, width, SHEET_HEIGHT, root);
        }
        if let Some(icon) = sheet.close_icon_node() {
            fill_hit_rect(width.saturating_sub(3), top, 3, 1, icon);
        }
        for row in 0..SHEET_HEIGHT {
            queue!(out, MoveTo(0, top + row), Print(" ".repeat(width as usize)))?;
        }
        queue!(
            out,
            MoveTo(2, top + 1),
            Print("Bottom sheet. Tap outside to close, drag to keep it."),
            MoveTo(width.saturating_sub(3), top),
            Print(" x ")
        )?;
    }

    out.flush()
}
