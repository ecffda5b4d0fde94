// src/tasm/literal.rs
// ============================================================================
// NESTED LITERAL - {{1,2},{3,4}}
// ============================================================================
//
// Un nivel de llaves por eje; el eje más interno contiene escalares.
// Sin espacios. Rank 0 → escalar sin llaves.
//
// ============================================================================

use crate::npy::NpyArray;

/// Renderiza el array completo como literal anidado
pub fn render_literal(array: &NpyArray) -> String {
    let mut out = String::with_capacity(array.numel().saturating_mul(4).saturating_add(2 * array.rank()));

    if array.rank() == 0 {
        out.push_str(&array.dtype().format_element(array.element(0)));
        return out;
    }

    render_axis(array, 0, 0, &mut out);
    out
}

fn render_axis(array: &NpyArray, axis: usize, base: usize, out: &mut String) {
    let shape = array.shape();
    let extent = shape[axis];

    out.push('{');

    if axis + 1 == shape.len() {
        let dtype = array.dtype();
        for i in 0..extent {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&dtype.format_element(array.element(base + i)));
        }
    } else {
        let stride: usize = shape[axis + 1..].iter().product();
        for i in 0..extent {
            if i > 0 {
                out.push(',');
            }
            render_axis(array, axis + 1, base + i * stride, out);
        }
    }

    out.push('}');
}
