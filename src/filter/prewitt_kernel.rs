use crate::Float;
use super::kernel::Kernel;

/// Central difference kernel. The normalizing constant makes the response the true
/// first derivative for unit pixel spacing.
pub struct PrewittKernel {
    kernel: Vec<Float>
}

impl PrewittKernel {
    pub fn new() -> PrewittKernel {
        PrewittKernel {
            kernel: vec![-1.0,0.0,1.0]
        }
    }
}

impl Kernel for PrewittKernel {
    fn kernel(&self) -> &Vec<Float> {
        &self.kernel
    }

    fn normalizing_constant(&self) -> Float {
        2.0
    }
}
