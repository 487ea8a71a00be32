use wasmtime::{ Engine, Instance, Linker, Module, Store, StoreLimitsBuilder, Val };

use crate::context::{ SharedState, SourceContext };
use crate::descriptor::Descriptor ;
use crate::error::{ InvokeError, LoadError };



/// Export run once right after instantiation, when present.
const INITIALIZE_EXPORT: &str = "initialize" ;

/// One instantiated source module with its own store.
///
/// The store's data is the source's [`SourceContext`], so every import called
/// while this source runs sees this source's memory and rate limiter.
pub struct Source {
	store: Store<SourceContext>,
	instance: Instance,
	fuel_per_call: Option<u64>,
}

impl std::fmt::Debug for Source {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "Source" )
			.field( "id", &self.store.data().source_id() )
			.field( "rate_limiter", self.store.data().rate_limiter() )
			.field( "fuel_per_call", &self.fuel_per_call )
			.finish_non_exhaustive()
	}
}

impl Source {

	pub(crate) fn instantiate(
		engine: &Engine,
		linker: &Linker<SourceContext>,
		module: &Module,
		id: String,
		host: SharedState,
		fuel_per_call: Option<u64>,
		max_memory: Option<usize>,
	) -> Result<Self, LoadError> {

		let mut limits = StoreLimitsBuilder::new();
		if let Some( bytes ) = max_memory { limits = limits.memory_size( bytes ); }

		let mut store = Store::new( engine, SourceContext::new( id, host, limits.build() ));
		store.limiter(| context | &mut context.limits );

		// Start functions run during instantiation and need fuel too.
		if let Some( fuel ) = fuel_per_call {
			store.set_fuel( fuel ).map_err( LoadError::Engine )?;
		}
		let instantiated = linker.instantiate( &mut store, module );
		if fuel_per_call.is_some() { let _ = store.set_fuel( 0 ); }
		let instance = instantiated.map_err( LoadError::Instantiation )?;

		let mut source = Self { store, instance, fuel_per_call };
		if source.instance.get_func( &mut source.store, INITIALIZE_EXPORT ).is_some() {
			source.call( INITIALIZE_EXPORT, &[] ).map_err( LoadError::Initialisation )?;
		}

		Ok( source )

	}

	pub fn id( &self ) -> &str { self.store.data().source_id() }

	pub fn context( &self ) -> &SourceContext { self.store.data() }

	pub fn context_mut( &mut self ) -> &mut SourceContext { self.store.data_mut() }

	/// Fuel left in the store, `None` when fuel is not metered.
	pub fn remaining_fuel( &self ) -> Option<u64> {
		self.fuel_per_call.and( self.store.get_fuel().ok() )
	}

	/// Calls export `name` with `args` and returns its results.
	///
	/// A trap, or an `env.abort` reported during the call, fails the call; the
	/// source stays usable for the next one.
	pub fn call( &mut self, name: &str, args: &[Val] ) -> Result<Vec<Val>, InvokeError> {

		let func = self.instance
			.get_func( &mut self.store, name )
			.ok_or_else(|| InvokeError::MissingExport( name.to_string() ))?;
		let ty = func.ty( &self.store );
		if ty.params().len() != args.len() {
			return Err( InvokeError::MissingExport( format!( "{name}: expected {} arguments", ty.params().len() )));
		}
		let mut results = vec![ Val::I32( 0 ); ty.results().len() ];

		if let Some( fuel ) = self.fuel_per_call {
			self.store.set_fuel( fuel ).map_err( InvokeError::Fuel )?;
		}
		self.store.data_mut().abort = None ;

		tracing::debug!( source = %self.id(), export = name, "call" );
		let call_result = func.call( &mut self.store, args, &mut results );

		// Reset fuel to 0 after call to prevent leakage to subsequent calls
		if self.fuel_per_call.is_some() { let _ = self.store.set_fuel( 0 ); }

		if let Some( message ) = self.store.data_mut().abort.take() {
			return Err( InvokeError::Aborted { message });
		}
		call_result.map_err( InvokeError::RuntimeException )?;
		Ok( results )

	}

	/// Calls an export that returns a descriptor.
	pub fn call_descriptor( &mut self, name: &str, args: &[Val] ) -> Result<Descriptor, InvokeError> {
		match self.call( name, args )?.first() {
			Some( Val::I32( descriptor )) => Ok( *descriptor ),
			_ => Err( InvokeError::InvalidResult( "descriptor" )),
		}
	}

}
