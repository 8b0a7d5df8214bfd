/// Control actions an observer can request from the closed-loop driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the run early and return the trajectory so far.
    StopEarly,
}
