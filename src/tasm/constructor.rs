// src/tasm/constructor.rs
// ============================================================================
// CONSTRUCTOR - Selección del constructor ntt según rank o toggle
// ============================================================================

use serde::Serialize;

/// Estilo de construcción pedido desde el CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorStyle {
    /// ntt::Tensor::from_vector con tag por rank
    #[default]
    Tensor,
    /// ntt::Matrix::create_from_vector / create_from_vector_vector
    Matrix { rows: bool },
}

/// Constructor concreto que aparece en el .tasm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constructor {
    Vec,
    Tensor2d,
    Tensor3d,
    Tensor4d,
    MatrixFromVector,
    MatrixFromVectorVector,
}

impl Constructor {
    /// 1 → vec, 2 → tensor2d, 3 → tensor3d, resto → tensor4d
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => Constructor::Vec,
            2 => Constructor::Tensor2d,
            3 => Constructor::Tensor3d,
            _ => Constructor::Tensor4d,
        }
    }

    /// El toggle ignora el rank
    pub fn for_toggle(rows: bool) -> Self {
        if rows {
            Constructor::MatrixFromVectorVector
        } else {
            Constructor::MatrixFromVector
        }
    }

    pub fn select(style: ConstructorStyle, rank: usize) -> Self {
        match style {
            ConstructorStyle::Tensor => Self::for_rank(rank),
            ConstructorStyle::Matrix { rows } => Self::for_toggle(rows),
        }
    }

    /// Identificador tal como se emite
    pub fn identifier(self) -> &'static str {
        match self {
            Constructor::Vec => "ntt::vec",
            Constructor::Tensor2d => "ntt::tensor2d",
            Constructor::Tensor3d => "ntt::tensor3d",
            Constructor::Tensor4d => "ntt::tensor4d",
            Constructor::MatrixFromVector => "create_from_vector",
            Constructor::MatrixFromVectorVector => "create_from_vector_vector",
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Constructor::MatrixFromVector | Constructor::MatrixFromVectorVector)
    }
}

impl std::fmt::Display for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}
