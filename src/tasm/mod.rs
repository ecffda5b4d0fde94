// src/tasm/mod.rs
// ============================================================================
// TASM - Fragmento C++ que construye el tensor ntt
// ============================================================================
//
// Plantilla tensor:
//
//   ntt::Tensor <name> = ntt::Tensor::from_vector(
//       <tag><literal>
//   );
//
// Plantilla matrix (toggle):
//
//   ntt::Matrix <name> = ntt::Matrix::<ctor>(
//       <literal>
//   );
//
// Ambas empiezan con una línea en blanco y terminan en '\n'.
//
// ============================================================================

pub mod constructor;
pub mod literal;

pub use constructor::{Constructor, ConstructorStyle};
pub use literal::render_literal;

/// Extensión del fragmento de texto
pub const TASM_EXT: &str = "tasm";

/// Renderiza la sentencia completa a partir del literal ya construido
pub fn render_statement(name: &str, constructor: Constructor, literal: &str) -> String {
    if constructor.is_matrix() {
        format!(
            "\nntt::Matrix {name} = ntt::Matrix::{ctor}(\n    {literal}\n);\n",
            ctor = constructor.identifier(),
        )
    } else {
        format!(
            "\nntt::Tensor {name} = ntt::Tensor::from_vector(\n    {tag}{literal}\n);\n",
            tag = constructor.identifier(),
        )
    }
}

/// ¿Es `name` un identificador C++ válido?
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
