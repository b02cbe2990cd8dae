use crate::{
    device::{BuildInput, Device},
    error::DeviceError,
};

/// Final traversable handle plus bookkeeping of its build
#[derive(Debug)]
pub struct AccelerationStructure<T> {
    pub handle: T,
    /// Size in bytes of the kept allocation
    pub size: usize,
    pub compacted: bool,
}

/// Build then compact if that saves memory.
///
/// Compaction replaces the handle only when the compacted size is strictly smaller.
pub fn build_acceleration_structure<D: Device>(
    device: &mut D,
    input: &BuildInput,
) -> Result<AccelerationStructure<D::Traversable>, DeviceError> {
    let (handle, sizes) = device.accel_build(input)?;
    log::debug!(
        "acceleration structure built: {} bytes, {} bytes once compacted",
        sizes.output_size,
        sizes.compacted_size
    );

    if sizes.compacted_size < sizes.output_size {
        let handle = device.accel_compact(handle, sizes.compacted_size)?;
        log::info!(
            "acceleration structure compacted from {} to {} bytes",
            sizes.output_size,
            sizes.compacted_size
        );
        Ok(AccelerationStructure {
            handle,
            size: sizes.compacted_size,
            compacted: true,
        })
    } else {
        Ok(AccelerationStructure {
            handle,
            size: sizes.output_size,
            compacted: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::build_acceleration_structure;
    use crate::device::{mock::MockDevice, BuildInput, BuildSizes, DeviceBuffer};

    fn build_with(output_size: usize, compacted_size: usize) -> (bool, usize, &'static str, usize) {
        let mut device = MockDevice {
            sizes: Some(BuildSizes {
                output_size,
                compacted_size,
            }),
            ..Default::default()
        };
        let input = BuildInput {
            vertex_buffer: DeviceBuffer::NULL,
            material_indices: &[0],
            material_count: 1,
        };
        let accel = build_acceleration_structure(&mut device, &input).unwrap();
        (accel.compacted, accel.size, accel.handle, device.compactions)
    }

    #[test]
    fn compacts_when_smaller() {
        assert_eq!(build_with(100, 60), (true, 60, "compacted", 1));
    }

    #[test]
    fn keeps_original_on_tie() {
        assert_eq!(build_with(100, 100), (false, 100, "original", 0));
    }

    #[test]
    fn keeps_original_when_larger() {
        assert_eq!(build_with(100, 120), (false, 100, "original", 0));
    }
}
