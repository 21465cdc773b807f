use crossterm::tty::IsTty;
use crossterm::{cursor, event, execute, queue, style, terminal};
use loopvis_core::plot;
use std::io::{self, Write};
use std::time;

const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const HAT: char = '▔';

#[derive(Debug)]
struct Layout {
    columns: usize,
    rows: usize,
    bar_columns: usize,
}

fn color(position: f32) -> style::Color {
    // Deep blue at the bass end, warm red in the treble
    let p = position.max(0.0).min(1.0);

    style::Color::Rgb {
        r: (40.0 + 215.0 * p) as u8,
        g: (90.0 + 60.0 * (1.0 - (2.0 * p - 1.0).abs())) as u8,
        b: (255.0 - 200.0 * p) as u8,
    }
}

fn draw(
    out: &mut io::Stdout,
    frames: &loopvis_core::Frames,
    layout: &Layout,
    status: &str,
) -> loopvis_core::Result<()> {
    let plot = frames.plot();

    queue!(out, cursor::MoveTo(0, 0), style::ResetColor, style::Print(status))?;
    queue!(out, terminal::Clear(terminal::ClearType::UntilNewLine))?;

    for row in 0..layout.rows {
        // Rows count downwards on screen, levels upwards
        let from_bottom = layout.rows - 1 - row;
        queue!(out, cursor::MoveTo(0, row as u16 + 1))?;

        for (bin, (level, hat)) in plot.bars().enumerate() {
            let eighths = (level * (layout.rows * 8) as f32) as usize;
            let fill = eighths.saturating_sub(from_bottom * 8).min(8);

            let hat_row = ((hat * layout.rows as f32) as usize).min(layout.rows - 1);
            let c = if fill < 8 && hat > 0.0 && hat_row == from_bottom && hat > level {
                HAT
            } else {
                BLOCKS[fill]
            };

            queue!(out, style::SetForegroundColor(color(plot.bin_position(bin))))?;
            for col in 0..layout.bar_columns {
                // Leave a gap between wider bars
                let c = if layout.bar_columns > 1 && col == layout.bar_columns - 1 {
                    ' '
                } else {
                    c
                };
                queue!(out, style::Print(c))?;
            }
        }

        queue!(
            out,
            style::ResetColor,
            terminal::Clear(terminal::ClearType::UntilNewLine)
        )?;
    }

    out.flush()?;

    Ok(())
}

fn layout(bar_columns: usize) -> loopvis_core::Result<Layout> {
    let (columns, rows) = terminal::size()?;
    let max_rows = loopvis_core::CONFIG.get_or("display.rows", 16);

    Ok(Layout {
        columns: columns as usize,
        rows: (rows as usize).saturating_sub(1).min(max_rows).max(1),
        bar_columns,
    })
}

fn run(out: &mut io::Stdout, bar_columns: usize) -> loopvis_core::Result<()> {
    let mut layout = layout(bar_columns)?;

    let mut plot = plot::PlotBuilder::new();
    plot.bin_width(bar_columns);

    let mut frames = loopvis_core::Visualizer::new()
        .plot(plot)
        .width(layout.columns)
        .frames()?;

    let target = frames.target_interval();

    loop {
        let start = time::Instant::now();

        let status = match frames.next_frame() {
            Ok(frame) => {
                log::trace!("Frame: {:7}@{:.3}", frame.frame, frame.time);

                let format = frames
                    .capture()
                    .format()
                    .map(|f| f.to_string())
                    .unwrap_or_default();
                let mode = if frames.decibel_mode() { "dB" } else { "linear" };

                format!(
                    " loopvis | {} | {} | frame {} | q: quit, d: decibel mode",
                    format, mode, frame.frame
                )
            }
            Err(e) => {
                match e {
                    loopvis_core::Error::NotInitialized => log::trace!("{}", e),
                    _ => log::error!("{}", e),
                }

                match frames.recover() {
                    Ok(true) => log::info!("Audio capture recovered"),
                    Ok(false) => (),
                    Err(e) => log::warn!("Reinitializing failed: {}", e),
                }

                format!(" loopvis | {} | q: quit", e)
            }
        };

        draw(out, &frames, &layout, &status)?;

        let mut remaining = target
            .checked_sub(start.elapsed())
            .unwrap_or_default();
        while event::poll(remaining)? {
            match event::read()? {
                event::Event::Key(event::KeyEvent {
                    code,
                    kind: event::KeyEventKind::Press,
                    ..
                }) => match code {
                    event::KeyCode::Char('q') | event::KeyCode::Esc => return Ok(()),
                    event::KeyCode::Char('d') => frames.toggle_decibel_mode(),
                    _ => (),
                },
                event::Event::Resize(..) => {
                    layout = self::layout(bar_columns)?;
                    frames.resize(layout.columns);
                    queue!(out, terminal::Clear(terminal::ClearType::All))?;
                }
                _ => (),
            }

            remaining = target
                .checked_sub(start.elapsed())
                .unwrap_or_default();
        }
    }
}

fn main() -> loopvis_core::Result<()> {
    loopvis_core::default_config();
    // The alternate screen owns the terminal, so only log when stderr goes elsewhere
    if io::stderr().is_tty() {
        loopvis_core::terminal_log();
    } else {
        loopvis_core::default_log();
    }

    let bar_columns = loopvis_core::CONFIG.get_or("display.bar_columns", 2usize).max(1);

    let mut out = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut out, bar_columns);

    execute!(
        out,
        style::ResetColor,
        cursor::Show,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;

    result
}
