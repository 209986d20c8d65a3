use anyhow::{Context, Result, bail};
use blob_world_core::{
    Action, Board, BoardConfig, Observation, Role,
    config::{BOARD_SIZE, DEFAULT_SEED, TURN_CAP},
    grid::Grid,
};
use clap::Parser;
use ratatui::{
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
};

/// Largest board that still fits a terminal one character per cell.
const MAX_DRAWN_SIZE: usize = 200;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of players
    #[arg(short, long, default_value_t = 1)]
    players: usize,

    /// Number of starting food items
    #[arg(short, long, default_value_t = 3)]
    food: usize,

    /// Number of enemies
    #[arg(short, long, default_value_t = 2)]
    enemies: usize,

    /// Width and height of the board
    #[arg(short, long, default_value_t = BOARD_SIZE)]
    size: usize,

    /// Seed for the first episode
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Leave players unnamed
    #[arg(long)]
    no_names: bool,

    /// Where to write the log (the terminal is taken by the UI)
    #[arg(long, value_name = "LOG_FILE", default_value = "blob_world.log")]
    log_file: PathBuf,
}

/// Colors used for each role. Passed to the renderer, never mutated.
#[derive(Debug, Clone, Copy)]
struct Palette {
    player: Color,
    food: Color,
    enemy: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            player: Color::Cyan,
            food: Color::Green,
            enemy: Color::Red,
        }
    }
}

impl Palette {
    fn color(&self, role: Role) -> Color {
        match role {
            Role::Player => self.player,
            Role::Food => self.food,
            Role::Enemy => self.enemy,
        }
    }

    fn glyph(role: Role) -> &'static str {
        match role {
            Role::Player => "@",
            Role::Food => "*",
            Role::Enemy => "E",
        }
    }
}

struct App {
    /// The board being played.
    board: Board,
    palette: Palette,
    /// Number of episodes started, used to derive the next seed.
    episode: u64,
    should_quit: bool,
}

impl App {
    fn new(board: Board, palette: Palette) -> Self {
        App {
            board,
            palette,
            episode: 0,
            should_quit: false,
        }
    }

    /// Moves every live player the same way and advances one turn.
    fn play(&mut self, dx: isize, dy: isize) {
        if self.board.is_done() {
            return;
        }
        let action = if dx == 0 && dy == 0 {
            Action::Wait
        } else {
            Action::Move { dx, dy }
        };
        let actions = vec![action; self.board.players().len()];
        self.board.step(&actions);
    }

    /// Starts the next episode with a fresh seed.
    fn restart(&mut self) {
        self.episode += 1;
        let seed = self.board.config().seed.wrapping_add(1);
        log::info!("Starting episode {} with seed {}", self.episode, seed);
        self.board.reset_with_seed(seed);
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.size > MAX_DRAWN_SIZE {
        bail!("Board size {} is too large to draw (max {MAX_DRAWN_SIZE})", args.size);
    }

    init_logging(&args.log_file)?;

    let config = BoardConfig::new(args.players, args.food, args.enemies)
        .with_size(args.size)
        .with_seed(args.seed)
        .with_names_enabled(!args.no_names);
    let board = Board::new(config).context("Invalid board configuration")?;
    let mut app = App::new(board, Palette::default());

    let mut terminal = setup_terminal()?;
    let outcome = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    outcome
}

/// Sends log output to a file, filtered by `RUST_LOG` (default `info`).
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Turn-based loop: the board only advances on a movement key.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                KeyCode::Char('r') => app.restart(),
                KeyCode::Char(' ') => app.play(0, 0),
                KeyCode::Left | KeyCode::Char('h') => app.play(-1, 0),
                KeyCode::Right | KeyCode::Char('l') => app.play(1, 0),
                // Row 0 is drawn at the top
                KeyCode::Up | KeyCode::Char('k') => app.play(0, -1),
                KeyCode::Down | KeyCode::Char('j') => app.play(0, 1),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(frame: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(frame.area());
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(columns[1]);

    let observation = app.board.observation();
    render_board(frame, columns[0], &observation, app.board.size(), &app.palette);
    render_status(frame, side[0], &app.board, &app.palette);

    let help_text = Paragraph::new("arrows/hjkl move, space waits, r restarts, q quits")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, side[1]);
}

/// Snaps every observed position onto a cell grid.
///
/// When roles share a cell, players are drawn over enemies and enemies over food.
fn rasterize(observation: &Observation, board_size: usize) -> Grid<Option<Role>> {
    let mut raster: Grid<Option<Role>> = Grid::covering(board_size);
    for role in [Role::Food, Role::Enemy, Role::Player] {
        for pos in observation.positions(role) {
            if let Some(cell) = raster.at_mut(*pos) {
                *cell = Some(role);
            }
        }
    }
    raster
}

fn render_board(
    frame: &mut Frame,
    area: Rect,
    observation: &Observation,
    board_size: usize,
    palette: &Palette,
) {
    let raster = rasterize(observation, board_size);

    let mut lines: Vec<Line> = Vec::with_capacity(raster.height());
    for y in 0..raster.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(raster.width());
        for x in 0..raster.width() {
            let span = match raster[(x, y)] {
                Some(role) => Span::styled(
                    Palette::glyph(role),
                    Style::default().fg(palette.color(role)).bold(),
                ),
                None => Span::styled(".", Style::default().fg(Color::DarkGray)),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let board_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Blob World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(board_paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect, board: &Board, palette: &Palette) {
    let status = if board.is_done() {
        Span::styled("Episode over, press 'r'", Style::default().fg(Color::Yellow).bold())
    } else {
        Span::raw("Running")
    };

    let mut items = vec![
        ListItem::from(Line::from(format!("Score: {}", board.score()))),
        ListItem::from(Line::from(format!(
            "Turn: {}/{}",
            board.turn_count(),
            board.turn_cap()
        ))),
        ListItem::from(Line::from(format!(
            "Food: {}  Enemies: {}",
            board.food().len(),
            board.enemies().len()
        ))),
        ListItem::from(Line::from(status)),
    ];
    items.extend(board.players().iter().map(|player| {
        ListItem::from(Line::from(Span::styled(
            player.to_string(),
            Style::default().fg(palette.color(Role::Player)),
        )))
    }));

    let status_widget =
        List::new(items).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, area);
}
