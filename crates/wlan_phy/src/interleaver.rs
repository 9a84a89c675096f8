/// Computes the interleaved bit index `j` for a coded-bit position `k`
/// within a block of `ncbps` coded bits per symbol, `nbpsc` bits per
/// subcarrier.
fn permuted_index(k: usize, ncbps: usize, nbpsc: usize) -> usize {
    let i = (ncbps / 16) * (k % 16) + k / 16;
    let s = (nbpsc / 2).max(1);
    s * (i / s) + (i + ncbps - (16 * i) / ncbps) % s
}

/// Applies the first (frequency-domain) permutation: `out[j] = in[k]`.
pub fn interleave(input: &[u8], output: &mut [u8], nbpsc: usize) {
    let ncbps = input.len();
    assert_eq!(output.len(), ncbps);
    for (k, &bit) in input.iter().enumerate() {
        let j = permuted_index(k, ncbps, nbpsc);
        output[j] = bit;
    }
}

/// Inverse permutation: `out[k] = in[j]`.
pub fn deinterleave(input: &[u8], output: &mut [u8], nbpsc: usize) {
    let ncbps = input.len();
    assert_eq!(output.len(), ncbps);
    for (k, slot) in output.iter_mut().enumerate() {
        let j = permuted_index(k, ncbps, nbpsc);
        *slot = input[j];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_for_every_rate() {
        for &(ncbps, nbpsc) in &[(48, 1), (96, 2), (192, 4), (288, 6)] {
            let input: Vec<u8> = (0..ncbps).map(|i| (i % 2) as u8).collect();
            let mut interleaved = vec![0u8; ncbps];
            interleave(&input, &mut interleaved, nbpsc);
            let mut recovered = vec![0u8; ncbps];
            deinterleave(&interleaved, &mut recovered, nbpsc);
            assert_eq!(recovered, input, "ncbps={ncbps} nbpsc={nbpsc}");
        }
    }

    #[test]
    fn permutation_is_a_bijection() {
        let ncbps = 192;
        let nbpsc = 4;
        let mut seen = vec![false; ncbps];
        for k in 0..ncbps {
            let j = permuted_index(k, ncbps, nbpsc);
            assert!(!seen[j], "index {j} hit twice");
            seen[j] = true;
        }
    }
}
