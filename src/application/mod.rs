// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the other layers into a training run.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1); progress goes to tracing
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow
pub mod train_use_case;

// Ctrl-C → cooperative stop flag
pub mod shutdown;
