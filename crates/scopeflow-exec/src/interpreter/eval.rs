//! Builtin kernel evaluation.
//!
//! Contains `eval_kernel`, which maps each [`KernelOp`] to its tensor
//! computation. Integer math is checked: overflow and integer division by
//! zero are kernel failures. Float math follows IEEE semantics.
//!
//! Binary ops accept operands of equal shape, or one single-element operand
//! that broadcasts over the other. Operand types promote
//! (`Bool < I32 < I64 < F32 < F64`); arithmetic on booleans widens to `I32`.

use scopeflow_core::id::NodeId;
use scopeflow_core::ops::{BinaryOp, CmpOp, KernelOp};
use scopeflow_core::tensor::{DataType, Tensor, TensorData};

use super::error::ExecError;

/// Evaluates a kernel op over already-resolved input tensors.
pub fn eval_kernel(op: &KernelOp, inputs: &[&Tensor], node: NodeId) -> Result<Tensor, ExecError> {
    match op {
        KernelOp::Const { value } => Ok(value.dup()),
        KernelOp::Identity => Ok(get_input(inputs, 0, node)?.dup()),
        KernelOp::Neg => eval_neg(get_input(inputs, 0, node)?, node),
        KernelOp::Binary { op } => {
            let lhs = get_input(inputs, 0, node)?;
            let rhs = get_input(inputs, 1, node)?;
            eval_binary(*op, lhs, rhs, node)
        }
        KernelOp::Compare { op } => {
            let lhs = get_input(inputs, 0, node)?;
            let rhs = get_input(inputs, 1, node)?;
            eval_compare(*op, lhs, rhs, node)
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: &Tensor, rhs: &Tensor, node: NodeId) -> Result<Tensor, ExecError> {
    let shape = broadcast_shape(lhs, rhs, node)?;
    let len: usize = shape.iter().product();
    let dtype = lhs.dtype().promote(rhs.dtype()).max(DataType::I32);

    let data = if dtype.is_float() {
        let a = lhs.data().to_f64_vec();
        let b = rhs.data().to_f64_vec();
        let out: Vec<f64> = (0..len)
            .map(|i| float_arith(op, pick(&a, i), pick(&b, i)))
            .collect();
        TensorData::from_f64(dtype, &out)
    } else {
        let a = ints(lhs);
        let b = ints(rhs);
        let out = (0..len)
            .map(|i| int_arith(op, pick(&a, i), pick(&b, i), node))
            .collect::<Result<Vec<i64>, _>>()?;
        narrow(dtype, out, node)?
    };

    build(&shape, data, node)
}

fn eval_compare(op: CmpOp, lhs: &Tensor, rhs: &Tensor, node: NodeId) -> Result<Tensor, ExecError> {
    macro_rules! cmp {
        ($a:expr, $b:expr) => {
            match op {
                CmpOp::Eq => $a == $b,
                CmpOp::Ne => $a != $b,
                CmpOp::Lt => $a < $b,
                CmpOp::Le => $a <= $b,
                CmpOp::Gt => $a > $b,
                CmpOp::Ge => $a >= $b,
            }
        };
    }

    let shape = broadcast_shape(lhs, rhs, node)?;
    let len: usize = shape.iter().product();

    let out: Vec<bool> = if lhs.dtype().is_float() || rhs.dtype().is_float() {
        let a = lhs.data().to_f64_vec();
        let b = rhs.data().to_f64_vec();
        (0..len).map(|i| cmp!(pick(&a, i), pick(&b, i))).collect()
    } else {
        let a = ints(lhs);
        let b = ints(rhs);
        (0..len).map(|i| cmp!(pick(&a, i), pick(&b, i))).collect()
    };

    build(&shape, TensorData::Bool(out), node)
}

fn eval_neg(input: &Tensor, node: NodeId) -> Result<Tensor, ExecError> {
    let dtype = input.dtype().max(DataType::I32);
    let data = if dtype.is_float() {
        let out: Vec<f64> = input.data().to_f64_vec().iter().map(|x| -x).collect();
        TensorData::from_f64(dtype, &out)
    } else {
        let out = ints(input)
            .into_iter()
            .map(|x| x.checked_neg().ok_or_else(|| overflow(node)))
            .collect::<Result<Vec<i64>, _>>()?;
        narrow(dtype, out, node)?
    };
    build(input.shape(), data, node)
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Max => a.max(b),
        BinaryOp::Min => a.min(b),
    }
}

fn int_arith(op: BinaryOp, a: i64, b: i64, node: NodeId) -> Result<i64, ExecError> {
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(|| overflow(node)),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(|| overflow(node)),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(|| overflow(node)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(ExecError::Kernel {
                    node,
                    message: "integer divide by zero".into(),
                });
            }
            a.checked_div(b).ok_or_else(|| overflow(node))
        }
        BinaryOp::Max => Ok(a.max(b)),
        BinaryOp::Min => Ok(a.min(b)),
    }
}

/// Converts i64 results back to the (integer) output type.
fn narrow(dtype: DataType, values: Vec<i64>, node: NodeId) -> Result<TensorData, ExecError> {
    match dtype {
        DataType::I32 => values
            .into_iter()
            .map(|v| i32::try_from(v).map_err(|_| overflow(node)))
            .collect::<Result<Vec<i32>, _>>()
            .map(TensorData::I32),
        DataType::I64 => Ok(TensorData::I64(values)),
        other => Err(ExecError::Kernel {
            node,
            message: format!("no integer kernel for {other}"),
        }),
    }
}

/// Output shape of an elementwise op over `lhs` and `rhs`.
fn broadcast_shape(lhs: &Tensor, rhs: &Tensor, node: NodeId) -> Result<Vec<usize>, ExecError> {
    if lhs.shape() == rhs.shape() {
        Ok(lhs.shape().to_vec())
    } else if lhs.len() == 1 {
        Ok(rhs.shape().to_vec())
    } else if rhs.len() == 1 {
        Ok(lhs.shape().to_vec())
    } else {
        Err(ExecError::Kernel {
            node,
            message: format!("cannot broadcast {lhs} with {rhs}"),
        })
    }
}

/// Element `i` of a possibly-broadcast operand.
fn pick<T: Copy>(values: &[T], i: usize) -> T {
    if values.len() == 1 {
        values[0]
    } else {
        values[i]
    }
}

fn ints(tensor: &Tensor) -> Vec<i64> {
    (0..tensor.len())
        .filter_map(|i| tensor.element_as_i64(i))
        .collect()
}

fn build(shape: &[usize], data: TensorData, node: NodeId) -> Result<Tensor, ExecError> {
    Tensor::new(shape, data).map_err(|e| ExecError::Kernel {
        node,
        message: e.to_string(),
    })
}

fn overflow(node: NodeId) -> ExecError {
    ExecError::Kernel {
        node,
        message: "integer overflow".into(),
    }
}

fn get_input<'t>(inputs: &[&'t Tensor], index: usize, node: NodeId) -> Result<&'t Tensor, ExecError> {
    inputs.get(index).copied().ok_or_else(|| ExecError::BadKernelInput {
        node,
        message: format!("kernel expects operand {index}, got {} operands", inputs.len()),
    })
}
