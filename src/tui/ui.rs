//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::decode::{Address, INSTRUCTION_WIDTH};
use crate::cpu::memory::PROGRAM_SIZE;
use super::app::{DebuggerApp, BYTES_PER_ROW};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: program memory, I/O and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_io(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:03}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let reg_span = |addr: Address| {
        let value = regs.get(addr).unwrap_or(0);
        let style = if value == 0 {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        vec![
            Span::raw(format!("{}: ", addr)),
            Span::styled(format!("{:3} ", value), style),
            Span::raw(format!("{:08b}   ", value)),
        ]
    };

    let content = vec![
        Line::from([reg_span(Address::Reg0), reg_span(Address::Reg1)].concat()),
        Line::from([reg_span(Address::Reg2), reg_span(Address::Reg3)].concat()),
        Line::from([reg_span(Address::Reg4), reg_span(Address::Reg5)].concat()),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:3}", regs.pc()), Style::default().fg(Color::Yellow)),
            Span::raw("   Ticks: "),
            Span::styled(format!("{}", app.cpu.ticks), Style::default().fg(Color::Cyan)),
            Span::raw("   Mode: "),
            Span::styled(format!("{:?}", app.cpu.mode()),
                if app.running {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw program memory as hex rows, highlighting the current instruction.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(app.memory_rows());
    let pc = app.cpu.regs.pc() as usize;
    let bytes = app.cpu.program().as_bytes();

    let in_current = |addr: usize| {
        (0..INSTRUCTION_WIDTH).any(|i| (pc + i) % PROGRAM_SIZE == addr)
    };

    let items: Vec<ListItem> = (start..end)
        .map(|row| {
            let base = row * BYTES_PER_ROW;
            let mut spans = vec![Span::raw(format!("{:03}: ", base))];
            for addr in base..(base + BYTES_PER_ROW).min(PROGRAM_SIZE) {
                let value = bytes[addr];
                let style = if in_current(addr) {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if value != 0 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{:02X} ", value), style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the IO port buffers.
fn draw_io(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let port = app.cpu.port();
    let output: Vec<String> = port.output().iter().map(|b| b.to_string()).collect();

    let io = Paragraph::new(vec![
        Line::from(format!("in:  {} pending", port.pending_input())),
        Line::from(format!("out: [{}]", output.join(", "))),
    ])
    .block(Block::default()
        .title(" IO ")
        .borders(Borders::ALL));

    frame.render_widget(io, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll program  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
