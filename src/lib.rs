use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashSet, VecDeque};

pub mod config;
pub mod render;

pub use config::{ConfigError, GameConfig};
use config::{INITIAL_LEN, INITIAL_LIVES, SPEED_BOOST_TICKS};

/// Integer coordinate in board units (a multiple of the cell pitch for every
/// on-board entity).
pub type Coord = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell `block` units away along `dir`.
    #[inline]
    pub fn shifted(self, dir: Direction, block: Coord) -> Self {
        let (dx, dy) = dir.dx_dy();
        Self::new(self.x + dx * block, self.y + dy * block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn dx_dy(self) -> (Coord, Coord) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    #[inline]
    pub fn is_opposite(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Up, Self::Down)
                | (Self::Down, Self::Up)
                | (Self::Right, Self::Left)
                | (Self::Left, Self::Right)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodKind {
    Regular,
    Bonus,
    Speed,
}

impl FoodKind {
    /// One of each kind is kept on the board, placed in this order.
    pub const ALL: [FoodKind; 3] = [Self::Regular, Self::Bonus, Self::Speed];

    pub fn points(self) -> u32 {
        match self {
            Self::Regular | Self::Speed => 1,
            Self::Bonus => 3,
        }
    }

    fn event(self) -> StepEvent {
        match self {
            Self::Regular => StepEvent::AteRegular,
            Self::Bonus => StepEvent::AteBonus,
            Self::Speed => StepEvent::AteSpeed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    pub pos: Point,
    pub kind: FoodKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// Snake is frozen in its collided pose; it respawns once the counter
    /// runs out.
    WallRecovery { ticks_remaining: u32 },
    Paused,
    GameOver,
}

/// What happened during a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    None,
    AteRegular,
    AteBonus,
    AteSpeed,
    WallHit,
    SelfHit,
}

/// Edge-triggered commands collected by the driver since the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInput {
    pub direction: Option<Direction>,
    pub pause: bool,
    pub restart: bool,
}

/// Board geometry, for mapping cells to screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub width: Coord,
    pub height: Coord,
    pub block: Coord,
}

impl Board {
    pub fn cols(&self) -> Coord {
        self.width / self.block
    }

    pub fn rows(&self) -> Coord {
        self.height / self.block
    }

    /// Whether `p` lies on a whole cell. A leftover strip narrower than one
    /// cell along the right or bottom edge counts as wall.
    pub fn contains(&self, p: Point) -> bool {
        let (w, h) = (self.cols() * self.block, self.rows() * self.block);
        p.x >= 0 && p.x < w && p.y >= 0 && p.y < h
    }

    /// Column/row of an on-board point.
    pub fn cell_of(&self, p: Point) -> Option<(Coord, Coord)> {
        self.contains(p)
            .then_some((p.x / self.block, p.y / self.block))
    }
}

/// UI-agnostic outcome of a step: everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub event: StepEvent,
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    /// Target tick rate (ticks per second) for scheduling the next step.
    pub speed: u32,
    pub speed_boost_ticks: u32,
    /// Head first.
    pub snake: Vec<Point>,
    pub foods: Vec<Food>,
    pub board: Board,
}

#[derive(Debug)]
pub struct Session {
    cfg: GameConfig,
    snake: VecDeque<Point>,
    dir: Direction,
    /// Applied at the start of the next running step if it's not a 180° turn.
    pending_dir: Option<Direction>,
    foods: Vec<Food>,
    rng: ChaCha8Rng,
    phase: Phase,
    score: u32,
    lives: u32,
    speed: u32,
    speed_boost_ticks: u32,
}

impl Session {
    pub fn with_seed(cfg: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create a new session drawing food positions from `rng`.
    pub fn with_rng(cfg: GameConfig, rng: ChaCha8Rng) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut session = Self {
            speed: cfg.base_speed,
            cfg,
            snake: VecDeque::new(),
            dir: Direction::Right,
            pending_dir: None,
            foods: Vec::with_capacity(FoodKind::ALL.len()),
            rng,
            phase: Phase::Running,
            score: 0,
            lives: INITIAL_LIVES,
            speed_boost_ticks: 0,
        };
        session.restart();
        Ok(session)
    }

    /// Create a new session with a non-deterministic seed.
    pub fn new(cfg: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, ChaCha8Rng::from_os_rng())
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn board(&self) -> Board {
        Board {
            width: self.cfg.width,
            height: self.cfg.height,
            block: self.cfg.block,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn speed_boost_ticks(&self) -> u32 {
        self.speed_boost_ticks
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn snake_segments(&self) -> impl Iterator<Item = &Point> {
        self.snake.iter()
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn head(&self) -> Point {
        *self.snake.front().expect("snake is non-empty")
    }

    /// Buffer a direction change for the next step. The last call before a
    /// step wins.
    pub fn queue_direction(&mut self, dir: Direction) {
        self.pending_dir = Some(dir);
    }

    /// Start over on the same board: score, lives, speed, snake and food.
    pub fn restart(&mut self) {
        self.phase = Phase::Running;
        self.score = 0;
        self.lives = INITIAL_LIVES;
        self.speed = self.cfg.base_speed;
        self.speed_boost_ticks = 0;
        self.foods.clear();
        self.reset_snake();
        self.place_foods();
        info!("new game on a {}x{} board", self.cfg.cols(), self.cfg.rows());
    }

    /// Re-centre the snake heading right. Score, lives and food stay put,
    /// except that food now covered by the snake is moved elsewhere.
    pub fn reset_snake(&mut self) {
        let b = self.cfg.block;
        let cx = self.cfg.cols() / 2 * b;
        let cy = self.cfg.rows() / 2 * b;

        self.snake.clear();
        for i in 0..INITIAL_LEN as Coord {
            self.snake.push_back(Point::new(cx - i * b, cy));
        }
        self.dir = Direction::Right;
        self.pending_dir = None;
        self.relocate_covered_foods();
    }

    /// Current state as a step result, without advancing.
    pub fn snapshot(&self) -> StepResult {
        self.result(StepEvent::None)
    }

    /// Advance the game by one tick.
    pub fn step(&mut self, input: StepInput) -> StepResult {
        if let Some(dir) = input.direction {
            self.pending_dir = Some(dir);
        }
        // Read once per step; anything not applied this tick is dropped.
        let pending = self.pending_dir.take();

        if input.restart {
            self.restart();
            return self.snapshot();
        }

        if input.pause {
            match self.phase {
                Phase::Running => {
                    self.phase = Phase::Paused;
                    debug!("paused");
                    return self.snapshot();
                }
                Phase::Paused => {
                    self.phase = Phase::Running;
                    debug!("resumed");
                }
                Phase::WallRecovery { .. } | Phase::GameOver => {}
            }
        }

        let event = match self.phase {
            Phase::Running => self.advance(pending),
            Phase::WallRecovery { ticks_remaining } => {
                self.tick_recovery(ticks_remaining);
                StepEvent::None
            }
            Phase::Paused | Phase::GameOver => StepEvent::None,
        };
        self.result(event)
    }

    fn advance(&mut self, pending: Option<Direction>) -> StepEvent {
        if let Some(next) = pending {
            if !next.is_opposite(self.dir) {
                self.dir = next;
            }
        }

        let next_head = self.head().shifted(self.dir, self.cfg.block);
        self.snake.push_front(next_head);

        if !self.board().contains(next_head) {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.phase = Phase::GameOver;
                info!("hit the wall with no lives left, final score {}", self.score);
            } else {
                self.phase = Phase::WallRecovery {
                    ticks_remaining: self.cfg.recovery_ticks(self.speed),
                };
                info!("hit the wall, {} lives remaining", self.lives);
            }
            return StepEvent::WallHit;
        }

        if self.snake.iter().skip(1).any(|&s| s == next_head) {
            self.phase = Phase::GameOver;
            info!("ran into itself, final score {}", self.score);
            return StepEvent::SelfHit;
        }

        let eaten = self
            .foods
            .iter()
            .find(|f| f.pos == next_head)
            .map(|f| f.kind);
        match eaten {
            Some(kind) => {
                self.eat(kind);
                // Any pickup refreshes the whole food set.
                self.place_foods();
                // A fresh boost starts counting down on the next tick, so
                // the boosted rate paces exactly SPEED_BOOST_TICKS more ticks.
                if kind != FoodKind::Speed {
                    self.tick_speed_boost();
                }
                kind.event()
            }
            None => {
                self.snake.pop_back();
                self.tick_speed_boost();
                StepEvent::None
            }
        }
    }

    fn eat(&mut self, kind: FoodKind) {
        self.score += kind.points();
        if kind == FoodKind::Speed {
            self.speed = self.cfg.boosted_speed();
            self.speed_boost_ticks = SPEED_BOOST_TICKS;
        }
        debug!("ate {kind:?} food, score {}", self.score);
    }

    fn tick_speed_boost(&mut self) {
        if self.speed_boost_ticks > 0 {
            self.speed_boost_ticks -= 1;
            if self.speed_boost_ticks == 0 {
                self.speed = self.cfg.base_speed;
                debug!("speed boost expired");
            }
        }
    }

    fn tick_recovery(&mut self, ticks_remaining: u32) {
        let ticks_remaining = ticks_remaining.saturating_sub(1);
        if ticks_remaining > 0 {
            self.phase = Phase::WallRecovery { ticks_remaining };
            return;
        }
        self.reset_snake();
        self.phase = Phase::Running;
        info!("snake respawned");
    }

    fn place_foods(&mut self) {
        self.foods.clear();
        for kind in FoodKind::ALL {
            match self.free_cell() {
                Some(pos) => self.foods.push(Food { pos, kind }),
                None => warn!("no free cell left for {kind:?} food"),
            }
        }
    }

    fn relocate_covered_foods(&mut self) {
        let covered: Vec<FoodKind> = self
            .foods
            .iter()
            .filter(|f| self.snake.contains(&f.pos))
            .map(|f| f.kind)
            .collect();
        if covered.is_empty() {
            return;
        }
        self.foods.retain(|f| !self.snake.contains(&f.pos));
        for kind in covered {
            match self.free_cell() {
                Some(pos) => self.foods.push(Food { pos, kind }),
                None => warn!("no free cell left for {kind:?} food"),
            }
        }
    }

    /// A uniformly random cell not covered by the snake or any food.
    fn free_cell(&mut self) -> Option<Point> {
        let (cols, rows, b) = (self.cfg.cols(), self.cfg.rows(), self.cfg.block);
        let occupied: HashSet<Point> = self
            .snake
            .iter()
            .copied()
            .chain(self.foods.iter().map(|f| f.pos))
            .collect();

        let max_attempts = (cols as usize)
            .saturating_mul(rows as usize)
            .saturating_mul(2)
            .max(8);
        for _ in 0..max_attempts {
            let x = self.rng.random_range(0..cols) * b;
            let y = self.rng.random_range(0..rows) * b;
            let p = Point::new(x, y);
            if !occupied.contains(&p) {
                return Some(p);
            }
        }

        // Crowded board: choose among whatever is left.
        let free: Vec<Point> = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Point::new(col * b, row * b)))
            .filter(|p| !occupied.contains(p))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }

    fn result(&self, event: StepEvent) -> StepResult {
        StepResult {
            event,
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            speed: self.speed,
            speed_boost_ticks: self.speed_boost_ticks,
            snake: self.snake.iter().copied().collect(),
            foods: self.foods.clone(),
            board: self.board(),
        }
    }
}
