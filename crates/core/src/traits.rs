use crate::Sample;

pub trait HasPosition {
    fn position(&self) -> [f64; 3];
}

impl HasPosition for [f64; 3] {
    fn position(&self) -> [f64; 3] {
        *self
    }
}

impl HasPosition for Sample {
    fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl<T: HasPosition + ?Sized> HasPosition for &T {
    fn position(&self) -> [f64; 3] {
        (**self).position()
    }
}
