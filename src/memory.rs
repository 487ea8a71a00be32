//! Marshaling between host values and the calling module's linear memory.
//!
//! Every import receives the [`Caller`] of the instance that is executing, so the
//! memory touched is always the one belonging to the module that made the call.
//! Every access is bounds-checked before any copy is made; a failed access is returned as an
//! error which the import propagates, trapping the guest call. Nothing here
//! clamps or truncates a guest range.

use thiserror::Error ;
use wasmtime::{ AsContext, AsContextMut, Caller, Extern, Memory };



/// Errors raised while touching guest memory. They always end the current guest call.
#[derive( Debug, Error )]
pub enum MemoryError {
	/// The module does not export a linear memory named `memory`.
	#[error( "Module Exports No Memory" )] MissingMemory,
	/// The range lies outside the module's linear memory.
	#[error( "Out Of Bounds: {len} bytes at {ptr:#x}" )] OutOfBounds { ptr: i32, len: usize },
}

/// View of one module instance's exported linear memory.
#[derive( Debug, Clone, Copy )]
pub(crate) struct GuestMemory {
	memory: Memory,
}

impl GuestMemory {

	/// Resolves the `memory` export of the calling instance.
	pub fn of<T>( caller: &mut Caller<'_, T> ) -> Result<Self, MemoryError> {
		caller.get_export( "memory" )
			.and_then( Extern::into_memory )
			.map(| memory | Self { memory })
			.ok_or( MemoryError::MissingMemory )
	}

	/// Copies `len` bytes starting at `ptr`. A negative length reads nothing.
	///
	/// The range is checked against the current memory size before anything is
	/// allocated, so a guest-chosen length can never exceed the module's memory.
	pub fn read_bytes( &self, store: impl AsContext, ptr: i32, len: i32 ) -> Result<Vec<u8>, MemoryError> {
		let len = usize::try_from( len ).unwrap_or( 0 );
		let start = offset( ptr );
		start.checked_add( len )
			.and_then(| end | self.memory.data( &store ).get( start..end ))
			.map( <[u8]>::to_vec )
			.ok_or( MemoryError::OutOfBounds { ptr, len })
	}

	/// Reads a byte string, replacing invalid UTF-8 sequences.
	pub fn read_string( &self, store: impl AsContext, ptr: i32, len: i32 ) -> Result<String, MemoryError> {
		self.read_bytes( store, ptr, len )
			.map(| bytes | String::from_utf8_lossy( &bytes ).into_owned() )
	}

	/// Writes `bytes` at `ptr`. The guest is responsible for having reserved the space.
	pub fn write_bytes( &self, mut store: impl AsContextMut, ptr: i32, bytes: &[u8] ) -> Result<(), MemoryError> {
		self.memory.write( &mut store, offset( ptr ), bytes )
			.map_err(|_| MemoryError::OutOfBounds { ptr, len: bytes.len() })
	}

	/// Reads `count` little-endian `u32` words starting at `ptr`.
	pub fn read_u32_array( &self, store: impl AsContext, ptr: i32, count: i32 ) -> Result<Vec<u32>, MemoryError> {
		let bytes = self.read_bytes( store, ptr, count.saturating_mul( 4 ))?;
		Ok( bytes.chunks_exact( 4 )
			.map(| word | u32::from_le_bytes([ word[0], word[1], word[2], word[3] ]))
			.collect()
		)
	}

	/// Reads a guest string object whose byte length is stored in the four bytes
	/// immediately before `ptr`. The payload is UTF-16LE.
	pub fn read_prefixed_string( &self, mut store: impl AsContextMut, ptr: i32 ) -> Result<String, MemoryError> {
		let header = self.read_bytes( &mut store, ptr.wrapping_sub( 4 ), 4 )?;
		let len = u32::from_le_bytes([ header[0], header[1], header[2], header[3] ]);
		let len = i32::try_from( len ).map_err(|_| MemoryError::OutOfBounds { ptr, len: len as usize })?;
		let units = self.read_bytes( &mut store, ptr, len )?
			.chunks_exact( 2 )
			.map(| unit | u16::from_le_bytes([ unit[0], unit[1] ]))
			.collect::<Vec<_>>();
		Ok( String::from_utf16_lossy( &units ))
	}

}

/// Guest pointers are unsigned 32-bit offsets carried in an `i32`.
#[allow( clippy::cast_sign_loss )]
fn offset( ptr: i32 ) -> usize { ptr as u32 as usize }
