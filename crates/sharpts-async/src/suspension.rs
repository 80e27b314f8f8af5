//! What kind of expression introduces a suspension (§C "Generator
//! lowering (non-async)" / "`async function*`").

use sharpts_ast::NodeId;

/// Which source construct a given suspension point corresponds to. The
/// hoisting/segmented-try machinery in `sharpts-async`/`sharpts-emitter`
/// treats all three identically — only the MoveNext emitter's resume
/// protocol (awaiter `get_result` vs. an externally supplied `MoveNext`
/// input value) differs between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuspensionKind {
    /// An `Await` expression: resumed by the async completion driver once
    /// the awaited task completes.
    Await,
    /// A `Yield` expression in a plain (non-async) generator: resumed by
    /// the next call to the external `MoveNext`, which supplies the value
    /// passed to `.next(value)`.
    Yield,
    /// A `Yield` expression inside an `async function*`: resumed the same
    /// way as `Yield`, but the surrounding function also has `Await`
    /// suspension points and the driver is the async-iterator protocol.
    AsyncYield,
}

/// One numbered suspension point within a function body, in source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuspensionPoint {
    /// The `Await`/`Yield` expression node this point corresponds to.
    pub node: NodeId,
    /// The monotonically increasing state number assigned by the
    /// analyzer (§4.1: "assigns each `Await` expression... a monotonically
    /// increasing state number").
    pub state: u32,
    pub kind: SuspensionKind,
    /// `true` for `yield* iter` — state dispatch delegates to an inner
    /// iterator rather than resuming this function's own body directly.
    pub is_delegating: bool,
}
