use crate::Coords;
use rand::Rng;
use tracing::{debug, info};
use Direction::*;

pub const DEFAULT_MOVE_DELAY_MS: u64 = 80;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

/// One grid cell of the body. Every segment moves along its own heading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment {
    pub pos: Coords,
    pub heading: Direction,
}

impl Segment {
    pub fn new(pos: Coords, heading: Direction) -> Self {
        Segment { pos, heading }
    }
}

/// What happened during one `tick`. A renderer may skip the frame when nothing changed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub spawned_bait: bool,
    pub moved: bool,
    pub ate: bool,
    pub died: bool,
}

impl TickOutcome {
    pub fn changed(&self) -> bool {
        self.spawned_bait || self.moved || self.ate || self.died
    }
}

/// Simulation state for a single life of the snake.
///
/// Coordinates are pixels and always a multiple of `box_size`. Index 0 of the body is the
/// head. The body never shrinks, and once dead the state stays dead: start a new one to
/// play again.
#[derive(Debug, Clone)]
pub struct SnakeState {
    segments: Vec<Segment>,
    bait: Option<Coords>,
    alive: bool,
    width: i32,
    height: i32,
    box_size: i32,
    last_move_ms: u64,
    move_delay_ms: u64,
}

impl SnakeState {
    pub fn new(width: i32, height: i32, box_size: i32) -> Self {
        Self::from_segments(width, height, box_size, vec![Segment::new((0, 0), Right)])
    }

    /// Builds a state from an explicit body, head first. An empty body gets the default
    /// single segment at the origin. A `box_size` below 1 is raised to 1.
    pub fn from_segments(width: i32, height: i32, box_size: i32, mut segments: Vec<Segment>) -> Self {
        if segments.is_empty() {
            segments.push(Segment::new((0, 0), Right));
        }
        let box_size = box_size.max(1);

        SnakeState {
            segments,
            bait: None,
            alive: true,
            width,
            height,
            box_size,
            last_move_ms: 0,
            move_delay_ms: DEFAULT_MOVE_DELAY_MS,
        }
    }

    pub fn with_move_delay(mut self, move_delay_ms: u64) -> Self {
        self.move_delay_ms = move_delay_ms;
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn head(&self) -> Segment {
        self.segments[0]
    }

    pub fn tail(&self) -> Segment {
        self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of baits eaten during this life.
    pub fn score(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn bait(&self) -> Option<Coords> {
        self.bait
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn box_size(&self) -> i32 {
        self.box_size
    }

    pub fn move_delay(&self) -> u64 {
        self.move_delay_ms
    }

    pub fn last_move_ms(&self) -> u64 {
        self.last_move_ms
    }

    /// Top-left coordinate of the last cell that fits entirely inside `bound`.
    pub fn last_cell(&self, bound: i32) -> i32 {
        ((bound - self.box_size) / self.box_size).max(0) * self.box_size
    }

    /// Per-frame update: spawn bait if missing, move if the move delay has elapsed, then
    /// resolve collisions.
    pub fn tick<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.alive {
            return outcome;
        }

        if self.bait.is_none() {
            self.spawn_bait(rng);
            outcome.spawned_bait = true;
        }

        if now_ms.saturating_sub(self.last_move_ms) > self.move_delay_ms {
            self.move_step(now_ms);
            outcome.moved = true;
        }

        let hits = self.check_collisions();
        outcome.ate = hits.ate;
        outcome.died = hits.died;
        outcome
    }

    /// Advances every segment one cell along its own heading, wrapping at the edges, then
    /// hands each heading one segment further down the body.
    pub fn move_step(&mut self, now_ms: u64) {
        if !self.alive {
            return;
        }

        let step = self.box_size;
        let (last_x, last_y) = (self.last_cell(self.width), self.last_cell(self.height));

        for seg in self.segments.iter_mut() {
            let (x, y) = seg.pos;
            seg.pos = match seg.heading {
                Up => (x, if y <= 0 { last_y } else { y - step }),
                Down => (x, if y >= last_y { 0 } else { y + step }),
                Left => (if x <= 0 { last_x } else { x - step }, y),
                Right => (if x >= last_x { 0 } else { x + step }, y),
            };
        }

        let mut prev = self.segments[0].heading;
        for seg in self.segments.iter_mut().skip(1) {
            prev = std::mem::replace(&mut seg.heading, prev);
        }

        self.last_move_ms = now_ms;
    }

    /// Points the head in a new direction. Reversals and turns while the head sits at or
    /// past a bound are ignored. Returns whether the turn was taken.
    pub fn turn(&mut self, direction: Direction) -> bool {
        if !self.alive {
            return false;
        }

        let (x, y) = self.segments[0].pos;
        if x >= self.width || y >= self.height {
            return false;
        }

        if self.segments[0].heading.is_opposite(direction) {
            debug!(?direction, "turn rejected, would reverse into the body");
            return false;
        }

        self.segments[0].heading = direction;
        true
    }

    /// Grows the body by one segment placed behind the tail.
    pub fn eat(&mut self) {
        let tail = self.tail();
        let (x, y) = tail.pos;
        let b = self.box_size;

        let pos = match tail.heading {
            Up => (x, y + b),
            Down => (x, y - b),
            Left => (x + b, y),
            Right => (x - b, y),
        };

        self.segments.push(Segment::new(pos, tail.heading));
    }

    pub fn check_collisions(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.alive {
            return outcome;
        }

        if let Some(bait) = self.bait {
            if self.overlaps(self.head().pos, bait) {
                self.eat();
                self.despawn_bait();
                outcome.ate = true;
                debug!(len = self.len(), "bait eaten");
            }
        }

        let head = self.head().pos;
        if self.segments[1..].iter().any(|seg| self.overlaps(head, seg.pos)) {
            self.alive = false;
            outcome.died = true;
            info!(score = self.score(), "snake bit itself");
        }

        outcome
    }

    /// Places bait on a random cell that lies fully inside the bounds.
    pub fn spawn_bait<R: Rng>(&mut self, rng: &mut R) {
        let cols = self.last_cell(self.width) / self.box_size;
        let rows = self.last_cell(self.height) / self.box_size;

        let bait = (
            rng.gen_range(0..=cols) * self.box_size,
            rng.gen_range(0..=rows) * self.box_size,
        );

        debug!(?bait, "bait spawned");
        self.bait = Some(bait);
    }

    pub fn despawn_bait(&mut self) {
        self.bait = None;
    }

    pub fn set_bait(&mut self, bait: Option<Coords>) {
        self.bait = bait;
    }

    fn overlaps(&self, a: Coords, b: Coords) -> bool {
        let s = self.box_size;
        a.0 < b.0 + s && b.0 < a.0 + s && a.1 < b.1 + s && b.1 < a.1 + s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const W: i32 = 900;
    const H: i32 = 700;
    const BOX: i32 = 30;

    fn headings(state: &SnakeState) -> Vec<Direction> {
        state.segments().iter().map(|s| s.heading).collect()
    }

    #[test]
    fn starts_with_single_segment_heading_right() {
        let state = SnakeState::new(W, H, BOX);
        assert_eq!(state.segments(), &[Segment::new((0, 0), Right)]);
        assert!(state.is_alive());
        assert_eq!(state.bait(), None);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn moves_right_then_wraps_to_zero() {
        let mut state = SnakeState::new(W, H, BOX);
        state.move_step(1);
        assert_eq!(state.head(), Segment::new((30, 0), Right));

        while state.head().pos.0 + BOX < W {
            state.move_step(1);
        }
        assert_eq!(state.head().pos, (870, 0));

        state.move_step(1);
        assert_eq!(state.head().pos, (0, 0));
    }

    #[test]
    fn wraps_from_origin_to_far_edges() {
        let mut up = SnakeState::from_segments(W, H, BOX, vec![Segment::new((60, 0), Up)]);
        up.move_step(1);
        assert_eq!(up.head().pos, (60, 660));

        let mut left = SnakeState::from_segments(W, H, BOX, vec![Segment::new((0, 90), Left)]);
        left.move_step(1);
        assert_eq!(left.head().pos, (870, 90));

        let mut down = SnakeState::from_segments(W, H, BOX, vec![Segment::new((60, 660), Down)]);
        down.move_step(1);
        assert_eq!(down.head().pos, (60, 0));
    }

    #[test]
    fn every_move_stays_within_bounds() {
        for &dir in &[Up, Down, Left, Right] {
            for x in (0..=W - BOX).step_by(BOX as usize) {
                for y in (0..=H - BOX).step_by(BOX as usize) {
                    let mut state = SnakeState::from_segments(W, H, BOX, vec![Segment::new((x, y), dir)]);
                    state.move_step(1);
                    let (nx, ny) = state.head().pos;
                    assert!(nx >= 0 && nx + BOX <= W, "x={} from {:?} {:?}", nx, (x, y), dir);
                    assert!(ny >= 0 && ny + BOX <= H, "y={} from {:?} {:?}", ny, (x, y), dir);
                }
            }
        }
    }

    #[test]
    fn headings_shift_one_step_towards_tail() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![
            Segment::new((300, 300), Up),
            Segment::new((330, 300), Left),
            Segment::new((330, 270), Down),
        ]);

        state.move_step(1);
        assert_eq!(headings(&state), vec![Up, Up, Left]);
        assert_eq!(state.segments()[0].pos, (300, 270));
        assert_eq!(state.segments()[1].pos, (300, 300));
        assert_eq!(state.segments()[2].pos, (330, 300));

        assert!(state.turn(Right));
        state.move_step(2);
        assert_eq!(headings(&state), vec![Right, Right, Up]);
    }

    #[test]
    fn reversal_is_ignored_for_every_pair() {
        for &dir in &[Up, Down, Left, Right] {
            let mut state = SnakeState::from_segments(W, H, BOX, vec![Segment::new((300, 300), dir)]);
            assert!(!state.turn(dir.opposite()));
            assert_eq!(state.head().heading, dir);
        }
    }

    #[test]
    fn last_turn_before_move_wins() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![Segment::new((300, 300), Right)]);
        assert!(state.turn(Up));
        assert!(state.turn(Left));
        state.move_step(1);
        assert_eq!(state.head(), Segment::new((270, 300), Left));
    }

    #[test]
    fn turn_ignored_when_head_is_past_a_bound() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![Segment::new((W, 300), Right)]);
        assert!(!state.turn(Up));
        assert_eq!(state.head().heading, Right);
    }

    #[test]
    fn eat_appends_behind_tail() {
        let cases = [
            (Up, (300, 330)),
            (Down, (300, 270)),
            (Left, (330, 300)),
            (Right, (270, 300)),
        ];

        for &(dir, expected) in &cases {
            let mut state = SnakeState::from_segments(W, H, BOX, vec![Segment::new((300, 300), dir)]);
            state.eat();
            assert_eq!(state.len(), 2);
            assert_eq!(state.tail(), Segment::new(expected, dir));
        }
    }

    #[test]
    fn eating_bait_grows_and_clears_it() {
        let mut state = SnakeState::new(W, H, BOX);
        state.set_bait(Some((0, 0)));

        let outcome = state.check_collisions();
        assert!(outcome.ate);
        assert!(!outcome.died);
        assert_eq!(state.len(), 2);
        assert_eq!(state.bait(), None);
        assert!(state.is_alive());
    }

    #[test]
    fn bait_next_to_head_is_not_eaten() {
        let mut state = SnakeState::new(W, H, BOX);
        state.set_bait(Some((30, 0)));
        assert!(!state.check_collisions().ate);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn head_on_body_kills() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![
            Segment::new((60, 60), Up),
            Segment::new((60, 90), Up),
            Segment::new((60, 60), Left),
        ]);

        let outcome = state.check_collisions();
        assert!(outcome.died);
        assert!(!state.is_alive());
    }

    #[test]
    fn bait_is_eaten_before_the_bite_is_checked() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![
            Segment::new((60, 60), Up),
            Segment::new((60, 90), Up),
            Segment::new((60, 60), Left),
        ]);
        state.set_bait(Some((60, 60)));

        let outcome = state.check_collisions();
        assert!(outcome.ate && outcome.died);
        assert_eq!(state.len(), 4);
        assert_eq!(state.tail(), Segment::new((90, 60), Left));
        assert_eq!(state.bait(), None);
        assert!(!state.is_alive());
    }

    #[test]
    fn zero_box_size_is_raised_to_one() {
        let mut state = SnakeState::new(W, H, 0);
        assert_eq!(state.box_size(), 1);

        state.move_step(1);
        assert_eq!(state.head().pos, (1, 0));

        let mut rng = StdRng::seed_from_u64(5);
        state.spawn_bait(&mut rng);
        let (x, y) = state.bait().unwrap();
        assert!(x < W && y < H);
    }

    #[test]
    fn single_segment_never_collides_with_itself() {
        let mut state = SnakeState::new(W, H, BOX);
        assert!(!state.check_collisions().died);
        assert!(state.is_alive());
    }

    #[test]
    fn dead_state_is_inert() {
        let mut state = SnakeState::from_segments(W, H, BOX, vec![
            Segment::new((60, 60), Up),
            Segment::new((60, 60), Up),
        ]);
        state.check_collisions();
        assert!(!state.is_alive());

        let mut rng = StdRng::seed_from_u64(1);
        assert!(!state.tick(10_000, &mut rng).changed());
        assert!(!state.turn(Left));
        assert_eq!(state.head().pos, (60, 60));
    }

    #[test]
    fn spawned_bait_is_on_grid_and_visible() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = SnakeState::new(W, H, BOX);

        for _ in 0..2000 {
            state.spawn_bait(&mut rng);
            let (x, y) = state.bait().unwrap();
            assert!(x >= 0 && x <= W - BOX);
            assert!(y >= 0 && y <= H - BOX);
            assert_eq!(x % BOX, 0);
            assert_eq!(y % BOX, 0);
        }
    }

    #[test]
    fn tick_moves_only_after_delay() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = SnakeState::new(W, H, BOX).with_move_delay(100);

        let first = state.tick(50, &mut rng);
        assert!(first.spawned_bait);
        assert!(!first.moved);
        assert_eq!(state.head().pos, (0, 0));

        assert!(!state.tick(100, &mut rng).moved);

        let moved = state.tick(101, &mut rng);
        assert!(moved.moved);
        assert_eq!(state.last_move_ms(), 101);
        assert!(!state.tick(150, &mut rng).moved);
    }

    #[test]
    fn length_never_shrinks_over_a_long_run() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = SnakeState::new(W, H, BOX).with_move_delay(0);
        let mut len = state.len();

        for now in 1..5000 {
            if !state.is_alive() {
                break;
            }
            if now % 7 == 0 {
                state.turn([Up, Left, Down, Right][(now / 7 % 4) as usize]);
            }
            let outcome = state.tick(now, &mut rng);
            assert!(state.len() >= len);
            if outcome.ate {
                assert_eq!(state.len(), len + 1);
            }
            len = state.len();
        }
    }
}
