#[cfg(test)]
#[ctor::ctor]
fn init_backtrace() {
    color_backtrace::install();
}

/// All `size`-element combinations of `items`, in index order.
pub fn combinations<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size > items.len() {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..size).collect();
    let mut result = Vec::new();

    loop {
        result.push(indices.iter().map(|&idx| items[idx].clone()).collect());

        // advance the rightmost index that still has room
        let mut position = size;
        while position > 0 && indices[position - 1] == items.len() - size + position - 1 {
            position -= 1;
        }
        if position == 0 {
            return result;
        }

        indices[position - 1] += 1;
        for idx in position..size {
            indices[idx] = indices[idx - 1] + 1;
        }
    }
}
