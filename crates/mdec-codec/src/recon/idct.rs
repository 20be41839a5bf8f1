//! 整数逆离散余弦变换 (基于 FFmpeg simple_idct 算法).
//!
//! W 常量按 2^14 缩放, 64 位累加, 兼容 IEEE 1180 精度要求.
//! 行列两趟一维变换, 偶/奇两组蝶形以权重矩阵表驱动.

/// W 常量: cos(i*π/16) * √2 * 2^14
const W1: i64 = 22725;
const W2: i64 = 21407;
const W3: i64 = 19266;
const W4: i64 = 16383;
const W5: i64 = 12873;
const W6: i64 = 8867;
const W7: i64 = 4520;

const ROW_SHIFT: u32 = 11;
const COL_SHIFT: u32 = 20;
const DC_ROW_SHIFT: u32 = 3;

/// 偶数蝶形: x0, x2, x4, x6 对 a0..a3 的贡献
const EVEN: [[i64; 4]; 4] = [
    [W4, W2, W4, W6],
    [W4, W6, -W4, -W2],
    [W4, -W6, -W4, W2],
    [W4, -W2, W4, -W6],
];

/// 奇数蝶形: x1, x3, x5, x7 对 b0..b3 的贡献
const ODD: [[i64; 4]; 4] = [
    [W1, W3, W5, W7],
    [W3, -W7, -W1, -W5],
    [W5, -W1, W7, W3],
    [W7, -W5, W3, -W1],
];

/// 8 点一维变换
fn transform8(x: &[i64; 8], shift: u32) -> [i32; 8] {
    let round = 1i64 << (shift - 1);
    let even_in = [x[0], x[2], x[4], x[6]];
    let odd_in = [x[1], x[3], x[5], x[7]];

    let mut out = [0i32; 8];
    for i in 0..4 {
        let mut a = round;
        let mut b = 0i64;
        for j in 0..4 {
            a += EVEN[i][j] * even_in[j];
            b += ODD[i][j] * odd_in[j];
        }
        out[i] = ((a + b) >> shift) as i32;
        out[7 - i] = ((a - b) >> shift) as i32;
    }
    out
}

/// 完整 8x8 IDCT, 原地变换 (行主序矩阵)
pub(crate) fn idct_8x8(block: &mut [i32; 64]) {
    // 行变换
    for row in 0..8 {
        let off = row * 8;
        let mut x = [0i64; 8];
        for (i, v) in x.iter_mut().enumerate() {
            *v = i64::from(block[off + i]);
        }

        // AC 全零行只需放大 DC
        if x[1..].iter().all(|&v| v == 0) {
            let val = (x[0] << DC_ROW_SHIFT) as i32;
            block[off..off + 8].fill(val);
            continue;
        }

        let out = transform8(&x, ROW_SHIFT);
        block[off..off + 8].copy_from_slice(&out);
    }

    // 列变换
    for col in 0..8 {
        let mut x = [0i64; 8];
        for (i, v) in x.iter_mut().enumerate() {
            *v = i64::from(block[col + i * 8]);
        }

        if x[1..].iter().all(|&v| v == 0) {
            let val = ((x[0] * W4 + (1i64 << (COL_SHIFT - 1))) >> COL_SHIFT) as i32;
            for i in 0..8 {
                block[col + i * 8] = val;
            }
            continue;
        }

        let out = transform8(&x, COL_SHIFT);
        for (i, v) in out.iter().enumerate() {
            block[col + i * 8] = *v;
        }
    }
}
