pub mod error;
pub mod events;
pub mod manipulation;
pub mod math;
pub mod oracle;
pub mod selection;
pub mod target;
/// The `reach_core` crate provides the engine-agnostic core of the Reach
/// immersive pointer-interaction toolkit: ray-based selection with pluggable
/// assistance extensions, and joystick/grab manipulation modes.
///
/// Key components:
/// - **Traits**: `CollisionOracle`, `InputSource`, `HapticSink`, and the trial evaluators.
/// - **Selection**: `RaycastSelector` with `SelectionExtension` hooks (inflation, viewport remap).
/// - **Manipulation**: `ModeCoordinator` cycling `TransformMode`s (joystick and grab), plus confirm relay.
/// - **Events**: observer lists and the trial-lifecycle gate.
pub mod traits;
