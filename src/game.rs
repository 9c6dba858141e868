use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::snake::{Direction, SnakeState};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Direction(Direction),
    Restart,
    Quit,
}

pub trait InputSource {
    /// Returns whatever events are pending, without blocking.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>>;

    /// Blocks until the next event arrives.
    fn wait_event(&mut self) -> Result<InputEvent>;
}

pub trait Renderer {
    fn draw(&mut self, state: &SnakeState) -> Result<()>;

    fn game_over(&mut self, state: &SnakeState) -> Result<()>;
}

enum LifeEnd {
    Died,
    Quit,
}

/// Drives one snake per life: input, fixed-rate frames, game over and restart.
pub struct GameLoop<I, R, C> {
    config: Config,
    input: I,
    renderer: R,
    clock: C,
    rng: StdRng,
    lives: u64,
}

impl<I: InputSource, R: Renderer, C: Clock> GameLoop<I, R, C> {
    pub fn new(config: Config, input: I, renderer: R, clock: C) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        GameLoop { config, input, renderer, clock, rng, lives: 0 }
    }

    /// Number of lives started so far.
    pub fn lives(&self) -> u64 {
        self.lives
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_parts(self) -> (I, R, C) {
        (self.input, self.renderer, self.clock)
    }

    /// Plays until the input source asks to quit.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut snake = self.config.new_snake();
            self.lives += 1;
            info!(life = self.lives, "new game");

            if let LifeEnd::Quit = self.play(&mut snake)? {
                return Ok(());
            }

            self.renderer.game_over(&snake)?;

            if !self.wait_for_restart()? {
                return Ok(());
            }
        }
    }

    fn play(&mut self, snake: &mut SnakeState) -> Result<LifeEnd> {
        let frame_ms = self.config.frame_ms();
        let mut first_frame = true;

        while snake.is_alive() {
            let frame_start = self.clock.now_ms();
            let mut turned = false;

            for event in self.input.poll_events()? {
                match event {
                    InputEvent::Direction(dir) => {
                        turned |= snake.turn(dir);
                    }
                    InputEvent::Quit => return Ok(LifeEnd::Quit),
                    InputEvent::Restart => {}
                }
            }

            let outcome = snake.tick(self.clock.now_ms(), &mut self.rng);
            if outcome.changed() || turned || first_frame {
                self.renderer.draw(snake)?;
                first_frame = false;
            }

            let elapsed = self.clock.now_ms().saturating_sub(frame_start);
            self.clock.sleep_ms(frame_ms.saturating_sub(elapsed));
        }

        Ok(LifeEnd::Died)
    }

    // Returns false if the player chose to quit instead
    fn wait_for_restart(&mut self) -> Result<bool> {
        loop {
            match self.input.wait_event()? {
                InputEvent::Restart => return Ok(true),
                InputEvent::Quit => return Ok(false),
                other => debug!(?other, "ignoring input while game over"),
            }
        }
    }
}
