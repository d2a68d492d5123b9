use rand::Rng;

pub fn shuffle_display_order<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..order.len()).rev() {
        let j = rng.random_range(0..=i);
        order.swap(i, j);
    }
    order
}

pub fn is_permutation(order: &[usize]) -> bool {
    let mut seen = vec![false; order.len()];
    for &value in order {
        match seen.get_mut(value) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

pub fn inverse_permutation(order: &[usize]) -> Option<Vec<usize>> {
    if !is_permutation(order) {
        return None;
    }
    let mut inverse = vec![0usize; order.len()];
    for (slot, &canonical) in order.iter().enumerate() {
        inverse[canonical] = slot;
    }
    Some(inverse)
}
