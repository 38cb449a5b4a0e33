//! Scripted control input for the headless runner.
//!
//! A script is a list of steps. Each step turns the current session state into
//! digital key intents, which go through the same [`MoveAxisSmoother`] ramp a
//! keyboard would, so scripted play exercises the real input path.

use std::f32::consts::PI;

use clap::ValueEnum;
use glam::{Vec2, Vec3};
use openworld_sim::{
    ControlInput, Mode, Session,
    input::{ActionEdges, DirectionKeys, MoveAxisSmoother},
    math::wrap_angle,
    world::interior,
};

/// Give up on a walk after this long.
const WALK_TIMEOUT: f32 = 40.0;
/// Give up on braking after this long.
const BRAKE_TIMEOUT: f32 = 8.0;
/// Brake until the car is slower than this.
const STOPPED_SPEED: f32 = 0.5;
/// Slight downward look while walking.
const WALK_PITCH: f32 = -0.15;

/// Built-in scenarios.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Wander around the spawn, sprinting and jumping.
    #[default]
    Stroll,
    /// Walk to the nearest car, drive, drift, brake and get out.
    Joyride,
    /// Visit a friend's house, talk and leave.
    Visit,
}

/// Steering for a drive step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    Straight,
    Left,
    Right,
}

/// One scripted step.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Walk until within `radius` of `target`.
    WalkTo { target: Vec3, radius: f32, run: bool },
    /// Walk forward while sweeping the camera, jumping now and then.
    Wander { duration: f32 },
    /// Press interact for one tick.
    Interact,
    /// Press talk for one tick.
    Talk,
    /// Hold the throttle.
    Drive {
        duration: f32,
        steer: Steer,
        handbrake: bool,
        boost: bool,
    },
    /// Hold reverse until the car has stopped.
    Brake,
    /// Release everything.
    Wait { duration: f32 },
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::WalkTo { .. } => "walk",
            Step::Wander { .. } => "wander",
            Step::Interact => "interact",
            Step::Talk => "talk",
            Step::Drive { .. } => "drive",
            Step::Brake => "brake",
            Step::Wait { .. } => "wait",
        }
    }
}

/// Plays a list of steps against a session.
#[derive(Debug)]
pub struct Script {
    steps: Vec<Step>,
    current: usize,
    step_time: f32,
    yaw: f32,
    smoother: MoveAxisSmoother,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            current: 0,
            step_time: 0.0,
            yaw: 0.0,
            smoother: MoveAxisSmoother::default(),
        }
    }

    /// Build the steps for a scenario from the session's world.
    pub fn for_scenario(scenario: Scenario, session: &Session) -> Self {
        let world = session.world();
        let steps = match scenario {
            Scenario::Stroll => vec![
                Step::Wander { duration: 20.0 },
                Step::Wait { duration: 2.0 },
                Step::Wander { duration: 20.0 },
            ],
            Scenario::Joyride => {
                let car = world
                    .vehicles
                    .iter()
                    .min_by(|a, b| {
                        let pa = a.position.distance(world.player.position);
                        let pb = b.position.distance(world.player.position);
                        pa.total_cmp(&pb)
                    })
                    .map(|car| car.position);
                let mut steps = Vec::new();
                if let Some(position) = car {
                    steps.extend([
                        Step::WalkTo {
                            target: position,
                            radius: 2.5,
                            run: true,
                        },
                        Step::Interact,
                        drive(4.0, Steer::Straight, false, false),
                        drive(2.0, Steer::Left, false, true),
                        drive(1.5, Steer::Left, true, false),
                        drive(3.0, Steer::Right, false, false),
                        Step::Brake,
                        Step::Interact,
                    ]);
                }
                steps.push(Step::Wander { duration: 10.0 });
                steps
            }
            Scenario::Visit => {
                let mut steps = Vec::new();
                if let Some(house) = world.houses.first() {
                    steps.extend([
                        Step::WalkTo {
                            target: house.door_position(),
                            radius: 2.0,
                            run: true,
                        },
                        Step::Interact,
                        Step::WalkTo {
                            target: interior::FRIEND,
                            radius: 2.0,
                            run: false,
                        },
                        Step::Talk,
                        Step::Wait { duration: 1.0 },
                        Step::WalkTo {
                            target: interior::EXIT_DOOR,
                            radius: 1.5,
                            run: false,
                        },
                        Step::Interact,
                    ]);
                }
                steps.push(Step::Wander { duration: 10.0 });
                steps
            }
        };
        Self::new(steps)
    }

    /// The step being played, if any remain.
    pub fn current(&self) -> Option<&Step> {
        self.steps.get(self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.steps.len()
    }

    fn advance(&mut self) {
        if let Some(step) = self.steps.get(self.current) {
            tracing::debug!(step = step.label(), after = self.step_time, "script step done");
        }
        self.current += 1;
        self.step_time = 0.0;
    }

    /// Produce the input for the next tick.
    pub fn next_input(&mut self, session: &Session, dt: f32) -> ControlInput {
        let Some(step) = self.steps.get(self.current).cloned() else {
            return self.finish_input(DirectionKeys::default(), dt);
        };
        self.step_time += dt;

        let world = session.world();
        match step {
            Step::WalkTo { target, radius, run } => {
                let offset = target - world.player.position;
                let flat = Vec2::new(offset.x, offset.z);
                if flat.length() < radius {
                    self.advance();
                    return self.finish_input(DirectionKeys::default(), dt);
                }
                if self.step_time > WALK_TIMEOUT {
                    tracing::warn!(?target, "walk timed out");
                    self.advance();
                }
                // Camera-relative forward is (-sin yaw, -cos yaw).
                self.yaw = (-flat.x).atan2(-flat.y);
                let mut input = self.finish_input(forward_keys(), dt);
                input.running = run;
                input
            }
            Step::Wander { duration } => {
                if self.step_time >= duration {
                    self.advance();
                }
                self.yaw = wrap_angle(self.yaw + 0.4 * dt);
                let mut input = self.finish_input(forward_keys(), dt);
                // Sprint in bursts and hop every few seconds.
                input.running = (self.step_time % 6.0) > 3.0;
                input.actions.jump = crossed(self.step_time, dt, 4.0);
                input
            }
            Step::Interact => {
                self.advance();
                let mut input = self.finish_input(DirectionKeys::default(), dt);
                input.actions = ActionEdges {
                    interact: true,
                    ..ActionEdges::default()
                };
                input
            }
            Step::Talk => {
                self.advance();
                let mut input = self.finish_input(DirectionKeys::default(), dt);
                input.actions = ActionEdges {
                    talk: true,
                    ..ActionEdges::default()
                };
                input
            }
            Step::Drive {
                duration,
                steer,
                handbrake,
                boost,
            } => {
                if self.step_time >= duration || session.mode() != Mode::Driving {
                    self.advance();
                }
                self.follow_car(session);
                let keys = DirectionKeys {
                    forward: true,
                    left: steer == Steer::Left,
                    right: steer == Steer::Right,
                    ..DirectionKeys::default()
                };
                let mut input = self.finish_input(keys, dt);
                input.handbrake = handbrake;
                input.running = boost;
                input
            }
            Step::Brake => {
                let stopped = world
                    .active()
                    .is_none_or(|car| car.forward_speed() < STOPPED_SPEED);
                if stopped || self.step_time > BRAKE_TIMEOUT {
                    self.advance();
                    return self.finish_input(DirectionKeys::default(), dt);
                }
                self.follow_car(session);
                let keys = DirectionKeys {
                    back: true,
                    ..DirectionKeys::default()
                };
                self.finish_input(keys, dt)
            }
            Step::Wait { duration } => {
                if self.step_time >= duration {
                    self.advance();
                }
                self.finish_input(DirectionKeys::default(), dt)
            }
        }
    }

    /// Keep the camera behind the car.
    fn follow_car(&mut self, session: &Session) {
        if let Some(car) = session.world().active() {
            self.yaw = wrap_angle(car.heading + PI);
        }
    }

    fn finish_input(&mut self, keys: DirectionKeys, dt: f32) -> ControlInput {
        let axis = self.smoother.update(keys, dt);
        ControlInput::with_move(axis).looking(self.yaw, WALK_PITCH)
    }
}

fn drive(duration: f32, steer: Steer, handbrake: bool, boost: bool) -> Step {
    Step::Drive {
        duration,
        steer,
        handbrake,
        boost,
    }
}

fn forward_keys() -> DirectionKeys {
    DirectionKeys {
        forward: true,
        ..DirectionKeys::default()
    }
}

/// Whether `t` crossed a multiple of `period` during the last `dt`.
fn crossed(t: f32, dt: f32, period: f32) -> bool {
    (t / period).floor() > ((t - dt) / period).floor()
}
