//! Commands accepted by the scheduling actor.

use warren_policy::PolicySource;

use crate::config::SimConfigPatch;

/// One request to the scheduler. Commands are handled one at a time,
/// to completion, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Merge a partial configuration and rebuild the environment.
    Configure(SimConfigPatch),
    /// Load a policy; the run state is untouched.
    LoadPolicy(PolicySource),
    /// Run at the given speed multiplier, ticking once immediately.
    Start(f64),
    /// Run again without an immediate tick, optionally changing speed.
    Resume(Option<f64>),
    /// Stop ticking.
    Pause,
    /// Run exactly this many ticks, then return to the previous state.
    Step(u32),
    /// Rebuild the environment from the current configuration.
    Reset,
    /// Stop, drop the policy, and end the actor.
    Dispose,
}
