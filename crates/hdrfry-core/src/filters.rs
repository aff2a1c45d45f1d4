//! Spatial filters and resampling on [`ImageBuf`].

use rayon::prelude::*;

use crate::image_buf::ImageBuf;

/// 3x3 smoothing kernel `[[1,1,1],[1,5,1],[1,1,1]] / 13`.
///
/// The one-pixel border is copied from the input unchanged.
pub fn smooth3x3(buf: &ImageBuf) -> ImageBuf {
    let mut out = buf.clone();
    if buf.width < 3 || buf.height < 3 {
        return out;
    }

    let w = buf.width as usize;
    let stride = buf.stride();
    let src = &buf.data;
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .skip(1)
        .take(buf.height as usize - 2)
        .for_each(|(y, row)| {
            for x in 1..w - 1 {
                for c in 0..3 {
                    let mut acc = 0.0;
                    for dy in [y - 1, y, y + 1] {
                        let base = dy * stride + c;
                        acc += src[base + (x - 1) * 3] + src[base + x * 3] + src[base + (x + 1) * 3];
                    }
                    // Center already counted once above; weight 5 total.
                    acc += 4.0 * src[y * stride + x * 3 + c];
                    row[x * 3 + c] = acc / 13.0;
                }
            }
        });
    out
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur with clamp-to-edge sampling.
pub fn gaussian_blur(buf: &ImageBuf, sigma: f32) -> ImageBuf {
    if sigma <= 0.0 || buf.is_empty() {
        return buf.clone();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let w = buf.width as i64;
    let h = buf.height as i64;
    let stride = buf.stride();

    let mut tmp = vec![0.0f32; buf.data.len()];
    tmp.par_chunks_mut(stride)
        .zip(buf.data.par_chunks(stride))
        .for_each(|(out_row, in_row)| {
            for x in 0..w {
                let mut acc = [0.0f32; 3];
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x + k as i64 - radius).clamp(0, w - 1) as usize * 3;
                    acc[0] += in_row[sx] * weight;
                    acc[1] += in_row[sx + 1] * weight;
                    acc[2] += in_row[sx + 2] * weight;
                }
                let dx = x as usize * 3;
                out_row[dx..dx + 3].copy_from_slice(&acc);
            }
        });

    let mut out = vec![0.0f32; buf.data.len()];
    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, out_row)| {
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - radius).clamp(0, h - 1) as usize;
                let in_row = &tmp[sy * stride..(sy + 1) * stride];
                for (o, i) in out_row.iter_mut().zip(in_row) {
                    *o += i * weight;
                }
            }
        });

    ImageBuf {
        width: buf.width,
        height: buf.height,
        data: out,
    }
}

/// Source index for nearest-neighbour resampling of pixel centers.
#[inline]
fn nearest_source(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    let src = (2 * dst as u64 + 1) * src_len as u64 / (2 * dst_len as u64);
    (src as u32).min(src_len - 1)
}

/// Nearest-neighbour resize. Target dimensions are raised to at least 1.
pub fn resize_nearest(buf: &ImageBuf, width: u32, height: u32) -> ImageBuf {
    let width = width.max(1);
    let height = height.max(1);
    if buf.is_empty() {
        return buf.clone();
    }

    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        let sy = nearest_source(y, height, buf.height);
        for x in 0..width {
            let sx = nearest_source(x, width, buf.width);
            data.extend_from_slice(&buf.pixel(sx, sy));
        }
    }
    ImageBuf {
        width,
        height,
        data,
    }
}

/// Circularly shift each of `rows` horizontally by `offset` pixels.
/// Positive offsets move content to the right.
pub fn roll_rows(buf: &mut ImageBuf, rows: std::ops::Range<u32>, offset: i64) {
    let w = buf.width as i64;
    if w == 0 {
        return;
    }
    let shift = offset.rem_euclid(w) as usize * 3;
    if shift == 0 {
        return;
    }
    let stride = buf.stride();
    for y in rows.start..rows.end.min(buf.height) {
        let start = y as usize * stride;
        buf.data[start..start + stride].rotate_right(shift);
    }
}
