use crate::foundation::core::{Canvas, PlacementBox};
use crate::foundation::error::{StageError, StageResult};

/// Compute the aspect-preserving placement of a `fg_w x fg_h` subject on the canvas.
///
/// The subject is constrained along the axis where it is relatively larger than the canvas,
/// centred horizontally and anchored `vertical_bias` of the way down the free vertical space.
pub fn fit(
    canvas: Canvas,
    fg_w: u32,
    fg_h: u32,
    padding_scale: f64,
    vertical_bias: f64,
) -> StageResult<PlacementBox> {
    if fg_w == 0 || fg_h == 0 {
        return Err(StageError::validation("foreground dimensions must be > 0"));
    }
    if !(padding_scale > 0.0 && padding_scale <= 1.0) {
        return Err(StageError::validation("padding scale must be in (0, 1]"));
    }
    if !(0.0..=1.0).contains(&vertical_bias) {
        return Err(StageError::validation("vertical bias must be in [0, 1]"));
    }

    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let canvas_aspect = cw / ch;
    let fg_aspect = f64::from(fg_w) / f64::from(fg_h);

    let (w, h) = if fg_aspect > canvas_aspect {
        let w = cw * padding_scale;
        (w, w / fg_aspect)
    } else {
        let h = ch * padding_scale;
        (h * fg_aspect, h)
    };

    Ok(PlacementBox {
        x: (cw - w) / 2.0,
        y: (ch - h) * vertical_bias,
        w,
        h,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
