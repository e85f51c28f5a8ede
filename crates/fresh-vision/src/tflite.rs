use std::{ffi::CString, os::raw::{c_char, c_int, c_void}, ptr};

use tracing::info;

use crate::backend::InferenceBackend;
use crate::config::BackendConfig;
use crate::error::InferenceError;
use crate::preprocess::InputTensor;

#[repr(C)]
struct TfLiteModel;
#[repr(C)]
struct TfLiteInterpreterOptions;
#[repr(C)]
struct TfLiteInterpreter;
#[repr(C)]
struct TfLiteTensor;

#[link(name = "tensorflowlite_c")]
extern "C" {
    fn TfLiteModelCreateFromFile(model_path: *const c_char) -> *mut TfLiteModel;
    fn TfLiteModelDelete(model: *mut TfLiteModel);

    fn TfLiteInterpreterOptionsCreate() -> *mut TfLiteInterpreterOptions;
    fn TfLiteInterpreterOptionsDelete(options: *mut TfLiteInterpreterOptions);
    fn TfLiteInterpreterOptionsSetNumThreads(options: *mut TfLiteInterpreterOptions, num_threads: c_int);

    fn TfLiteInterpreterCreate(model: *const TfLiteModel, options: *const TfLiteInterpreterOptions) -> *mut TfLiteInterpreter;
    fn TfLiteInterpreterDelete(interpreter: *mut TfLiteInterpreter);

    fn TfLiteInterpreterAllocateTensors(interpreter: *mut TfLiteInterpreter) -> c_int;
    fn TfLiteInterpreterInvoke(interpreter: *mut TfLiteInterpreter) -> c_int;

    fn TfLiteInterpreterGetInputTensor(interpreter: *mut TfLiteInterpreter, index: c_int) -> *mut TfLiteTensor;
    fn TfLiteInterpreterGetOutputTensor(interpreter: *mut TfLiteInterpreter, index: c_int) -> *const TfLiteTensor;

    fn TfLiteTensorData(tensor: *const TfLiteTensor) -> *mut c_void;
    fn TfLiteTensorByteSize(tensor: *const TfLiteTensor) -> usize;

    fn TfLiteTensorNumDims(tensor: *const TfLiteTensor) -> c_int;
    fn TfLiteTensorDim(tensor: *const TfLiteTensor, dim_index: c_int) -> c_int;
}

/// Float32 TFLite model driven through the C API.
pub struct TfliteBackend {
    name: String,
    input: (u32, u32),
    model: *mut TfLiteModel,
    opts: *mut TfLiteInterpreterOptions,
    interp: *mut TfLiteInterpreter,
}

// The raw handles are only touched through `&mut self`.
unsafe impl Send for TfliteBackend {}

fn unavailable(msg: impl Into<String>) -> InferenceError {
    InferenceError::ModelUnavailable(msg.into())
}

impl TfliteBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self, InferenceError> {
        let model_path = cfg.model_path.as_deref().ok_or_else(|| unavailable("tflite backend needs model_path"))?;
        let cpath = CString::new(model_path).map_err(|e| unavailable(format!("model_path: {}", e)))?;
        let input = crate::backend::model_input(cfg)?;

        let mut this = Self {
            name: format!("tflite:{}", model_path),
            input,
            model: ptr::null_mut(),
            opts: ptr::null_mut(),
            interp: ptr::null_mut(),
        };

        this.model = unsafe { TfLiteModelCreateFromFile(cpath.as_ptr()) };
        if this.model.is_null() {
            return Err(unavailable(format!("failed to load tflite model: {}", model_path)));
        }

        this.opts = unsafe { TfLiteInterpreterOptionsCreate() };
        if this.opts.is_null() {
            return Err(unavailable("failed to create tflite options"));
        }
        let threads = cfg.threads.unwrap_or(2).max(1) as c_int;
        unsafe { TfLiteInterpreterOptionsSetNumThreads(this.opts, threads); }

        this.interp = unsafe { TfLiteInterpreterCreate(this.model, this.opts) };
        if this.interp.is_null() {
            return Err(unavailable("failed to create tflite interpreter"));
        }

        let rc = unsafe { TfLiteInterpreterAllocateTensors(this.interp) };
        if rc != 0 {
            return Err(unavailable("TfLiteInterpreterAllocateTensors failed"));
        }

        info!("vision: loaded TFLite model: {} ({} threads)", model_path, threads);
        Ok(this)
    }

    pub fn inspect(&mut self) -> Result<String, InferenceError> {
        self.ensure_open()?;
        let input = unsafe { TfLiteInterpreterGetInputTensor(self.interp, 0) };
        if input.is_null() {
            return Err(InferenceError::MalformedTensor("no input tensor".into()));
        }
        let in_dims = tensor_dims(input);
        let in_bytes = unsafe { TfLiteTensorByteSize(input) };

        let out0 = unsafe { TfLiteInterpreterGetOutputTensor(self.interp, 0) };
        if out0.is_null() {
            return Err(InferenceError::MalformedTensor("no output tensor 0".into()));
        }
        let out_dims = tensor_dims(out0);
        let out_bytes = unsafe { TfLiteTensorByteSize(out0) };

        Ok(format!(
            "TFLite inspect ({}):\n- input[0] dims={:?} bytes={}\n- output[0] dims={:?} bytes={}\n",
            self.name, in_dims, in_bytes, out_dims, out_bytes
        ))
    }

    fn ensure_open(&self) -> Result<(), InferenceError> {
        if self.interp.is_null() {
            return Err(unavailable(format!("{} is closed", self.name)));
        }
        Ok(())
    }

    fn release(&mut self) {
        unsafe {
            if !self.interp.is_null() { TfLiteInterpreterDelete(self.interp); }
            if !self.opts.is_null() { TfLiteInterpreterOptionsDelete(self.opts); }
            if !self.model.is_null() { TfLiteModelDelete(self.model); }
        }
        self.interp = ptr::null_mut();
        self.opts = ptr::null_mut();
        self.model = ptr::null_mut();
    }
}

impl InferenceBackend for TfliteBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> (u32, u32) {
        self.input
    }

    fn infer(&mut self, tensor: &InputTensor) -> Result<Vec<f32>, InferenceError> {
        self.ensure_open()?;

        let input = unsafe { TfLiteInterpreterGetInputTensor(self.interp, 0) };
        if input.is_null() {
            return Err(InferenceError::MalformedTensor("no input tensor".into()));
        }
        let in_bytes = unsafe { TfLiteTensorByteSize(input) };
        let in_ptr = unsafe { TfLiteTensorData(input) as *mut f32 };
        if in_ptr.is_null() {
            return Err(InferenceError::MalformedTensor("null input tensor data".into()));
        }

        let need = tensor.data.len() * std::mem::size_of::<f32>();
        if in_bytes != need {
            return Err(InferenceError::MalformedTensor(format!(
                "input tensor is {} bytes, preprocessed {:?} is {}",
                in_bytes,
                tensor.shape(),
                need
            )));
        }
        unsafe { ptr::copy_nonoverlapping(tensor.data.as_ptr(), in_ptr, tensor.data.len()); }

        let rc = unsafe { TfLiteInterpreterInvoke(self.interp) };
        if rc != 0 {
            return Err(InferenceError::Backend(format!("TfLiteInterpreterInvoke failed: {}", rc)));
        }

        let out = unsafe { TfLiteInterpreterGetOutputTensor(self.interp, 0) };
        if out.is_null() {
            return Err(InferenceError::MalformedTensor("no output tensor 0".into()));
        }
        let out_ptr = unsafe { TfLiteTensorData(out) as *const f32 };
        if out_ptr.is_null() {
            return Err(InferenceError::MalformedTensor("null output tensor data".into()));
        }
        let out_bytes = unsafe { TfLiteTensorByteSize(out) };
        let out_len = out_bytes / std::mem::size_of::<f32>();
        let raw = unsafe { std::slice::from_raw_parts(out_ptr, out_len) };
        Ok(raw.to_vec())
    }

    fn close(&mut self) {
        self.release();
    }
}

fn tensor_dims(t: *const TfLiteTensor) -> Vec<i32> {
    unsafe {
        let nd = TfLiteTensorNumDims(t);
        let mut v = Vec::with_capacity(nd.max(0) as usize);
        for i in 0..nd { v.push(TfLiteTensorDim(t, i)); }
        v
    }
}

impl Drop for TfliteBackend {
    fn drop(&mut self) {
        self.release();
    }
}
