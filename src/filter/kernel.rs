use crate::Float;

pub trait Kernel {
    // Filter taps
    fn kernel(&self) -> &Vec<Float>;
    // Half of the width of the kernel save the center element
    fn radius(&self) -> usize {
        (self.kernel().len()-1)/2
    }
    // Accumulated samples are divided by this
    fn normalizing_constant(&self) -> Float;
}
