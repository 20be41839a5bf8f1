//! 重建用固定查找表: zig-zag 扫描序与默认量化矩阵.

/// zig-zag 扫描序 -> 8x8 矩阵下标 (行主序)
pub(crate) const ZIGZAG_TO_MATRIX: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, //
    17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, //
    27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, //
    29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, //
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// 控制台默认量化矩阵 (行主序)
pub const PSX_QUANT_MATRIX: [u8; 64] = [
    2, 16, 19, 22, 26, 27, 29, 34, //
    16, 16, 22, 24, 27, 29, 34, 37, //
    19, 22, 26, 27, 29, 34, 34, 38, //
    22, 22, 26, 27, 29, 34, 37, 40, //
    22, 26, 27, 29, 32, 35, 40, 48, //
    26, 27, 29, 32, 35, 40, 48, 58, //
    26, 27, 29, 34, 38, 46, 56, 69, //
    27, 29, 35, 38, 46, 56, 69, 83,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_is_permutation() {
        let mut seen = [false; 64];
        for &idx in &ZIGZAG_TO_MATRIX {
            assert!(!seen[idx], "矩阵下标 {} 重复", idx);
            seen[idx] = true;
        }
    }

    #[test]
    fn test_zigzag_corners() {
        assert_eq!(ZIGZAG_TO_MATRIX[0], 0);
        assert_eq!(ZIGZAG_TO_MATRIX[1], 1);
        assert_eq!(ZIGZAG_TO_MATRIX[2], 8);
        assert_eq!(ZIGZAG_TO_MATRIX[63], 63);
    }

    #[test]
    fn test_quant_matrix_dc_entry() {
        assert_eq!(PSX_QUANT_MATRIX[0], 2);
        assert_eq!(PSX_QUANT_MATRIX[63], 83);
    }
}
