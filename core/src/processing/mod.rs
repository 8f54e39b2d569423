pub mod detector;
pub mod locator;
pub mod physics;
pub mod window;

pub use detector::EventDetector;
pub use locator::ImpactLocator;
pub use physics::{FlightSolution, PhysicsResolver};
pub use window::WindowCalculator;
